use std::cmp::Ordering;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{RawRecord, Recommendation},
};

use super::{
    corpus::Corpus,
    similarity::{SimilarityEngine, SimilarityStrategy},
    vector_space::VectorSpace,
};

/// Summary of a built model, exposed to operators
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelStats {
    pub corpus_size: usize,
    pub vocabulary_size: usize,
    pub strategy: SimilarityStrategy,
    pub stored_entries: usize,
    pub built_at: DateTime<Utc>,
}

/// Immutable genre-similarity model: corpus, vector space and similarity
/// engine, built together and replaced together
#[derive(Debug)]
pub struct RecommendationModel {
    corpus: Corpus,
    engine: SimilarityEngine,
    built_at: DateTime<Utc>,
}

impl RecommendationModel {
    /// Runs the full pipeline over raw catalog records.
    ///
    /// Fails with [`AppError::EmptyCorpus`] when no record survives
    /// normalization; the caller cannot serve queries in that case.
    pub fn build(records: Vec<RawRecord>, strategy: SimilarityStrategy) -> AppResult<Self> {
        let (corpus, report) = Corpus::build(records);
        tracing::info!(
            rows_read = report.rows_read,
            kept = report.kept,
            missing_title = report.missing_title,
            missing_genres = report.missing_genres,
            untagged = report.untagged,
            "Catalog normalized"
        );
        Self::from_corpus(corpus, strategy)
    }

    pub fn from_corpus(corpus: Corpus, strategy: SimilarityStrategy) -> AppResult<Self> {
        if corpus.is_empty() {
            tracing::error!("No catalog items left after normalization");
            return Err(AppError::EmptyCorpus);
        }

        let started = Instant::now();
        let space = VectorSpace::fit(&corpus.tag_lists())?;
        let engine = SimilarityEngine::build(space, strategy);

        tracing::info!(
            corpus_size = corpus.len(),
            vocabulary_size = engine.space().vocabulary().len(),
            strategy = %strategy,
            stored_entries = engine.stored_entries(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recommendation model built"
        );

        Ok(Self {
            corpus,
            engine,
            built_at: Utc::now(),
        })
    }

    /// Up to `k` titles most similar in genre to `query_title`.
    ///
    /// The title is matched case-insensitively. When several rows carry the
    /// title, the lowest row id is the query row, and every row with that
    /// title is left out of the results. Ties in score keep ascending row
    /// order. Fewer than `k` results, including none, is not an error.
    pub fn recommend(&self, query_title: &str, k: usize) -> AppResult<Vec<Recommendation>> {
        let query = query_title.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Please enter a movie title".to_string(),
            ));
        }

        let matches = self
            .corpus
            .rows_for_title(query)
            .ok_or_else(|| AppError::NotFound(query.to_string()))?;
        let row = matches[0];

        if k == 0 {
            return Ok(Vec::new());
        }

        let scores = self
            .engine
            .row(row)
            .ok_or_else(|| AppError::Internal(format!("similarity row {} missing", row)))?;

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(candidate, _)| matches.binary_search(candidate).is_err())
            .collect();

        if ranked.len() > k {
            ranked.select_nth_unstable_by(k, by_score);
            ranked.truncate(k);
        }
        ranked.sort_unstable_by(by_score);

        let recommendations = ranked
            .into_iter()
            .filter_map(|(candidate, score)| {
                let item = self.corpus.get(candidate)?;
                Some(Recommendation {
                    title: item.title.clone(),
                    rating: item.rating,
                    score,
                })
            })
            .collect();

        Ok(recommendations)
    }

    /// Cosine similarity between two corpus rows
    pub fn similarity(&self, i: usize, j: usize) -> Option<f64> {
        self.engine.similarity(i, j)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            corpus_size: self.corpus.len(),
            vocabulary_size: self.engine.space().vocabulary().len(),
            strategy: self.engine.strategy(),
            stored_entries: self.engine.stored_entries(),
            built_at: self.built_at,
        }
    }
}

/// Score descending, then row ascending: a total order, so ranking is
/// deterministic regardless of sort stability
fn by_score(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
