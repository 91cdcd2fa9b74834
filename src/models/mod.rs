use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Sentinel shown in place of a missing rating
pub const UNKNOWN_RATING: &str = "N/A";

/// A catalog row as supplied by a [`CatalogSource`](crate::services::CatalogSource)
///
/// Cells that are absent or empty are `None`; nothing has been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub vote_average: Option<String>,
}

impl RawRecord {
    pub fn new(title: &str, genres: &str, vote_average: Option<&str>) -> Self {
        Self {
            title: Some(title.to_string()),
            genres: Some(genres.to_string()),
            vote_average: vote_average.map(str::to_string),
        }
    }
}

/// Average vote for a title, or an explicit unknown marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    Score(f64),
    Unknown,
}

impl Rating {
    /// Parses a raw `vote_average` cell. Blank, non-numeric and non-finite
    /// values all become [`Rating::Unknown`].
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|score| score.is_finite())
            .map(Rating::Score)
            .unwrap_or(Rating::Unknown)
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Score(score) => write!(f, "{}", score),
            Rating::Unknown => write!(f, "{}", UNKNOWN_RATING),
        }
    }
}

/// Serialized as a JSON number, or as `"N/A"` when unknown
impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rating::Score(score) => serializer.serialize_f64(*score),
            Rating::Unknown => serializer.serialize_str(UNKNOWN_RATING),
        }
    }
}

/// A catalog item that survived normalization
///
/// `id` is the row position in the corpus and stays stable for the lifetime
/// of the model that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: usize,
    pub title: String,
    pub raw_genres: String,
    /// Genre names in source order; never empty inside a corpus
    pub tags: Vec<String>,
    pub rating: Rating,
}

impl CatalogItem {
    /// Genre names joined by single spaces
    pub fn clean_tags(&self) -> String {
        self.tags.join(" ")
    }
}

/// One ranked neighbour returned for a query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub rating: Rating,
    /// Cosine similarity to the queried title, in `[0, 1]`
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_parse_numeric() {
        assert_eq!(Rating::parse(Some("7.5")), Rating::Score(7.5));
        assert_eq!(Rating::parse(Some(" 6 ")), Rating::Score(6.0));
    }

    #[test]
    fn test_rating_parse_unknown() {
        assert_eq!(Rating::parse(None), Rating::Unknown);
        assert_eq!(Rating::parse(Some("")), Rating::Unknown);
        assert_eq!(Rating::parse(Some("not rated")), Rating::Unknown);
        assert_eq!(Rating::parse(Some("NaN")), Rating::Unknown);
    }

    #[test]
    fn test_rating_display() {
        assert_eq!(format!("{}", Rating::Score(8.1)), "8.1");
        assert_eq!(format!("{}", Rating::Unknown), "N/A");
    }

    #[test]
    fn test_rating_serialization() {
        assert_eq!(serde_json::to_string(&Rating::Score(7.5)).unwrap(), "7.5");
        assert_eq!(serde_json::to_string(&Rating::Unknown).unwrap(), "\"N/A\"");
    }

    #[test]
    fn test_recommendation_serialization() {
        let rec = Recommendation {
            title: "Heat".to_string(),
            rating: Rating::Unknown,
            score: 0.5,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["title"], "Heat");
        assert_eq!(json["rating"], "N/A");
        assert_eq!(json["score"], 0.5);
    }

    #[test]
    fn test_clean_tags_joins_in_order() {
        let item = CatalogItem {
            id: 0,
            title: "Heat".to_string(),
            raw_genres: String::new(),
            tags: vec!["Crime".to_string(), "Science Fiction".to_string()],
            rating: Rating::Unknown,
        };
        assert_eq!(item.clean_tags(), "Crime Science Fiction");
    }
}
