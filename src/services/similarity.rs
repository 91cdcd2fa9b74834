//! Cosine similarity over L2-normalized document vectors
//!
//! Both strategies walk an inverted index (feature -> postings), so a row
//! only touches documents sharing at least one tag with the query.
//!
//! * `Lazy` keeps just the index and computes one row per query:
//!   O(V + postings) memory, O(sum of posting lengths) per query.
//! * `Eager` additionally materializes every non-zero pair at build time as
//!   a sparse row-major matrix. Queries become lookups, but memory grows with
//!   the number of co-tagged pairs, which for a genre catalog approaches N².
//!   Only suitable for catalogs up to the low tens of thousands.

use serde::{Deserialize, Serialize};

use super::vector_space::{DocumentVector, VectorSpace};

/// How pairwise similarity is computed and retained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityStrategy {
    /// Compute one row on demand per query
    #[default]
    Lazy,
    /// Precompute the full sparse matrix at build time
    Eager,
}

impl std::fmt::Display for SimilarityStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityStrategy::Lazy => write!(f, "lazy"),
            SimilarityStrategy::Eager => write!(f, "eager"),
        }
    }
}

/// Non-zero similarities per row, ascending by column
#[derive(Debug, Clone)]
struct SparseMatrix {
    rows: Vec<Vec<(usize, f64)>>,
}

impl SparseMatrix {
    fn get(&self, i: usize, j: usize) -> Option<f64> {
        let row = self.rows.get(i)?;
        Some(
            row.binary_search_by_key(&j, |(col, _)| *col)
                .map(|pos| row[pos].1)
                .unwrap_or(0.0),
        )
    }

    fn entries(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Answers `similarity(i, j)` and whole-row queries for a fitted vector space
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    space: VectorSpace,
    /// feature -> (row, weight), ascending by row
    postings: Vec<Vec<(usize, f64)>>,
    matrix: Option<SparseMatrix>,
    strategy: SimilarityStrategy,
}

impl SimilarityEngine {
    pub fn build(space: VectorSpace, strategy: SimilarityStrategy) -> Self {
        let mut postings = vec![Vec::new(); space.vocabulary().len()];
        for (row, doc) in space.documents().iter().enumerate() {
            for &(feature, weight) in doc.entries() {
                postings[feature].push((row, weight));
            }
        }

        let mut engine = Self {
            space,
            postings,
            matrix: None,
            strategy,
        };

        if strategy == SimilarityStrategy::Eager {
            let rows: Vec<Vec<(usize, f64)>> = engine
                .space
                .documents()
                .iter()
                .map(|doc| {
                    engine
                        .accumulate(doc)
                        .into_iter()
                        .enumerate()
                        .filter(|(_, score)| *score > 0.0)
                        .collect::<Vec<_>>()
                })
                .collect();
            let matrix = SparseMatrix { rows };
            tracing::debug!(
                rows = engine.space.len(),
                stored_entries = matrix.entries(),
                "Materialized similarity matrix"
            );
            engine.matrix = Some(matrix);
        }

        engine
    }

    pub fn strategy(&self) -> SimilarityStrategy {
        self.strategy
    }

    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.space.len()
    }

    pub fn is_empty(&self) -> bool {
        self.space.is_empty()
    }

    /// Number of similarity values held in memory (zero for `Lazy`)
    pub fn stored_entries(&self) -> usize {
        self.matrix.as_ref().map(SparseMatrix::entries).unwrap_or(0)
    }

    /// Cosine similarity of rows `i` and `j`, or `None` if either is out of range
    pub fn similarity(&self, i: usize, j: usize) -> Option<f64> {
        let a = self.space.document(i)?;
        let b = self.space.document(j)?;
        match &self.matrix {
            Some(matrix) => matrix.get(i, j),
            None => Some(cosine(a, b)),
        }
    }

    /// Similarity of row `i` against every row, indexed by row id
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        let doc = self.space.document(i)?;
        match &self.matrix {
            Some(matrix) => {
                let mut scores = vec![0.0; self.space.len()];
                for &(col, score) in &matrix.rows[i] {
                    scores[col] = score;
                }
                Some(scores)
            }
            None => Some(self.accumulate(doc)),
        }
    }

    /// Scores `doc` against every row through the postings lists.
    ///
    /// Contributions are added in ascending feature order, matching
    /// [`DocumentVector::dot`], so results are symmetric and identical
    /// across strategies.
    fn accumulate(&self, doc: &DocumentVector) -> Vec<f64> {
        let mut scores = vec![0.0; self.space.len()];
        for &(feature, weight) in doc.entries() {
            for &(row, other) in &self.postings[feature] {
                scores[row] += weight * other;
            }
        }
        for score in &mut scores {
            *score = score.clamp(0.0, 1.0);
        }
        scores
    }
}

/// Cosine of two normalized vectors; zero when either has no weight
fn cosine(a: &DocumentVector, b: &DocumentVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.dot(b).clamp(0.0, 1.0)
}
