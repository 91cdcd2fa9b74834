//! Genre-based movie recommendations.
//!
//! Catalog rows are normalized into tag lists, embedded in a TF-IDF vector
//! space and ranked by cosine similarity against a queried title. The
//! [`api`] module serves the model over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
