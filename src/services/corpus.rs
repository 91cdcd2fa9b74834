use std::collections::HashMap;

use crate::models::{CatalogItem, RawRecord, Rating};

use super::tag_normalizer::normalize_tags;

/// Lookup key for case-insensitive exact title matching
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Counts of what happened to each raw record during corpus construction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CorpusReport {
    pub rows_read: usize,
    pub kept: usize,
    pub missing_title: usize,
    pub missing_genres: usize,
    pub untagged: usize,
}

/// Catalog items eligible for recommendation, in source order
///
/// Every item has at least one tag, and `items[i].id == i`.
#[derive(Debug, Clone)]
pub struct Corpus {
    items: Vec<CatalogItem>,
    /// Lowercased title -> ascending row ids carrying that title
    title_index: HashMap<String, Vec<usize>>,
}

impl Corpus {
    /// Filters and normalizes raw records.
    ///
    /// Records without a non-blank title or without a genre field are dropped
    /// first; records whose genre field yields no tags are dropped after
    /// normalization. Survivors are numbered in their original order.
    pub fn build<I>(records: I) -> (Self, CorpusReport)
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut report = CorpusReport::default();
        let mut items = Vec::new();
        let mut title_index: HashMap<String, Vec<usize>> = HashMap::new();

        for record in records {
            report.rows_read += 1;

            let Some(title) = record
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
            else {
                report.missing_title += 1;
                continue;
            };
            let Some(raw_genres) = record.genres else {
                report.missing_genres += 1;
                continue;
            };

            let tags = normalize_tags(Some(&raw_genres));
            if tags.is_empty() {
                report.untagged += 1;
                continue;
            }

            let id = items.len();
            title_index.entry(title_key(title)).or_default().push(id);
            items.push(CatalogItem {
                id,
                title: title.to_string(),
                raw_genres,
                tags,
                rating: Rating::parse(record.vote_average.as_deref()),
            });
        }

        report.kept = items.len();
        (Self { items, title_index }, report)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: usize) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    /// Rows whose title matches `title` ignoring case and surrounding
    /// whitespace, lowest row first
    pub fn rows_for_title(&self, title: &str) -> Option<&[usize]> {
        self.title_index.get(&title_key(title)).map(Vec::as_slice)
    }

    /// Tag lists in row order, the input to vector space fitting
    pub fn tag_lists(&self) -> Vec<&[String]> {
        self.items.iter().map(|item| item.tags.as_slice()).collect()
    }
}
