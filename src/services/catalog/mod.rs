//! Catalog data sources
//!
//! A source produces the raw rows the recommendation model is built from.
//! The server reads one at startup and again on every reload.

use crate::{error::AppResult, models::RawRecord};

pub mod csv_source;

pub use csv_source::CsvCatalogSource;

/// Trait for catalog data sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Loads every catalog row, in source order
    async fn load(&self) -> AppResult<Vec<RawRecord>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Source backed by rows already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogSource {
    records: Vec<RawRecord>,
}

impl InMemoryCatalogSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemoryCatalogSource {
    async fn load(&self) -> AppResult<Vec<RawRecord>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}
