pub mod catalog;
pub mod corpus;
pub mod recommender;
pub mod similarity;
pub mod tag_normalizer;
pub mod vector_space;

pub use catalog::{CatalogSource, CsvCatalogSource, InMemoryCatalogSource};
pub use corpus::{Corpus, CorpusReport};
pub use recommender::{ModelStats, RecommendationModel};
pub use similarity::{SimilarityEngine, SimilarityStrategy};
pub use vector_space::{DocumentVector, VectorSpace, Vocabulary};
