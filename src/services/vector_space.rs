//! TF-IDF vector space over genre tags
//!
//! The unit of vocabulary is a whole tag name, lowercased, so multi-word tags
//! such as "Science Fiction" stay a single feature. Weights use raw term
//! counts and the smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1`, and every document vector is L2-normalized,
//! which makes cosine similarity a plain dot product.

use std::collections::{BTreeMap, HashMap};

use crate::error::{AppError, AppResult};

/// Token -> feature index, fixed at fit time
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Feature index for a tag, matched case-insensitively
    pub fn feature(&self, tag: &str) -> Option<usize> {
        self.index.get(&token(tag)?).copied()
    }

    pub fn idf(&self, feature: usize) -> Option<f64> {
        self.idf.get(feature).copied()
    }
}

/// Sparse, L2-normalized TF-IDF weights for one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentVector {
    /// (feature, weight), ascending by feature, weights strictly positive
    entries: Vec<(usize, f64)>,
    dimension: usize,
}

impl DocumentVector {
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Always equal to the vocabulary size
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merging the two sorted entry lists.
    ///
    /// Products are summed in ascending feature order, so `a.dot(b)` and
    /// `b.dot(a)` are bit-for-bit equal.
    pub fn dot(&self, other: &DocumentVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (fa, wa) = self.entries[i];
            let (fb, wb) = other.entries[j];
            match fa.cmp(&fb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// A fitted vocabulary plus the vectors of the documents it was fitted on
#[derive(Debug, Clone)]
pub struct VectorSpace {
    vocabulary: Vocabulary,
    documents: Vec<DocumentVector>,
}

impl VectorSpace {
    /// Fits the vocabulary on `documents` and transforms each of them.
    ///
    /// Fails with [`AppError::EmptyCorpus`] when there are no documents or
    /// no document contributes a single token.
    pub fn fit<D: AsRef<[String]>>(documents: &[D]) -> AppResult<Self> {
        if documents.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        // Sorted map so feature indices do not depend on hash order
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let mut seen: Vec<String> = doc.as_ref().iter().filter_map(|t| token(t)).collect();
            seen.sort_unstable();
            seen.dedup();
            for tok in seen {
                *document_frequency.entry(tok).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let n = documents.len() as f64;
        let mut index = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (feature, (tok, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(tok, feature);
        }

        let vocabulary = Vocabulary { index, idf };
        let documents = documents
            .iter()
            .map(|doc| vocabulary_transform(&vocabulary, doc.as_ref()))
            .collect();

        Ok(Self {
            vocabulary,
            documents,
        })
    }

    /// Vectorizes an arbitrary tag list; tags outside the vocabulary are ignored
    pub fn transform(&self, tags: &[String]) -> DocumentVector {
        vocabulary_transform(&self.vocabulary, tags)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn documents(&self) -> &[DocumentVector] {
        &self.documents
    }

    pub fn document(&self, row: usize) -> Option<&DocumentVector> {
        self.documents.get(row)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn token(tag: &str) -> Option<String> {
    let tag = tag.trim();
    (!tag.is_empty()).then(|| tag.to_lowercase())
}

fn vocabulary_transform(vocabulary: &Vocabulary, tags: &[String]) -> DocumentVector {
    let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
    for tag in tags {
        if let Some(feature) = vocabulary.feature(tag) {
            *counts.entry(feature).or_insert(0.0) += 1.0;
        }
    }

    let mut entries: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(feature, tf)| (feature, tf * vocabulary.idf[feature]))
        .collect();

    let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, weight) in &mut entries {
            *weight /= norm;
        }
    }

    DocumentVector {
        entries,
        dimension: vocabulary.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|tags| tags.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(matches!(VectorSpace::fit(&empty), Err(AppError::EmptyCorpus)));
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        let blank = docs(&[&[], &["  "]]);
        assert!(matches!(VectorSpace::fit(&blank), Err(AppError::EmptyCorpus)));
    }

    #[test]
    fn test_vocabulary_is_sorted_and_case_folded() {
        let space = VectorSpace::fit(&docs(&[&["Drama", "Action"], &["action", "Science Fiction"]]))
            .unwrap();
        let vocab = space.vocabulary();

        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.feature("Action"), Some(0));
        assert_eq!(vocab.feature("DRAMA"), Some(1));
        assert_eq!(vocab.feature("science fiction"), Some(2));
        assert_eq!(vocab.feature("Science"), None);
    }

    #[test]
    fn test_smoothed_idf() {
        let space = VectorSpace::fit(&docs(&[&["Action"], &["Action", "Drama"], &["Comedy"]]))
            .unwrap();
        let vocab = space.vocabulary();

        let action = vocab.idf(vocab.feature("Action").unwrap()).unwrap();
        let drama = vocab.idf(vocab.feature("Drama").unwrap()).unwrap();
        assert!((action - ((4.0_f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((drama - ((4.0_f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert!(drama > action);
    }

    #[test]
    fn test_vectors_are_l2_normalized_with_full_dimension() {
        let space = VectorSpace::fit(&docs(&[&["Action", "Drama", "Drama"], &["Comedy"]])).unwrap();

        for doc in space.documents() {
            assert_eq!(doc.dimension(), space.vocabulary().len());
            assert!((doc.norm() - 1.0).abs() < 1e-12);
            assert!(doc.entries().windows(2).all(|w| w[0].0 < w[1].0));
        }
    }

    #[test]
    fn test_term_frequency_counts_repeats() {
        let space = VectorSpace::fit(&docs(&[&["Action", "Drama", "Drama"]])).unwrap();
        let entries = space.document(0).unwrap().entries();
        // single document: both idf values are 1, so weights are 1:2 before normalizing
        assert!((entries[1].1 / entries[0].1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_dot_is_symmetric() {
        let space = VectorSpace::fit(&docs(&[
            &["Action", "Adventure", "Thriller"],
            &["Adventure", "Thriller", "Drama"],
        ]))
        .unwrap();
        let a = space.document(0).unwrap();
        let b = space.document(1).unwrap();
        assert_eq!(a.dot(b), b.dot(a));
        assert!(a.dot(b) > 0.0 && a.dot(b) < 1.0);
    }

    #[test]
    fn test_transform_ignores_unknown_tags() {
        let space = VectorSpace::fit(&docs(&[&["Action"], &["Drama"]])).unwrap();
        let vector = space.transform(&["Action".to_string(), "Western".to_string()]);
        assert_eq!(vector.entries().len(), 1);
        assert!((vector.norm() - 1.0).abs() < 1e-12);

        let unknown = space.transform(&["Western".to_string()]);
        assert!(unknown.is_empty());
        assert_eq!(unknown.norm(), 0.0);
    }
}
