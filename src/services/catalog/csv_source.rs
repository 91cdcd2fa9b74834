use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use csv::StringRecord;
use flate2::read::GzDecoder;

use super::CatalogSource;
use crate::{
    error::{AppError, AppResult},
    models::RawRecord,
};

const TITLE_COLUMN: &str = "title";
const GENRES_COLUMN: &str = "genres";
const RATING_COLUMN: &str = "vote_average";

/// Catalog read from a CSV file with a header row
///
/// `title` and `genres` columns are required, `vote_average` is optional.
/// Paths ending in `.gz` are decompressed on the fly.
#[derive(Debug, Clone)]
pub struct CsvCatalogSource {
    path: PathBuf,
}

impl CsvCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for CsvCatalogSource {
    async fn load(&self) -> AppResult<Vec<RawRecord>> {
        let path = self.path.clone();
        tracing::info!(path = %path.display(), "Loading catalog");

        let records = tokio::task::spawn_blocking(move || read_catalog(&path))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::info!(rows = records.len(), "Catalog loaded");
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Opens `path`, gunzipping when it ends in `.gz`, and parses it
pub fn read_catalog(path: &Path) -> AppResult<Vec<RawRecord>> {
    let file = File::open(path)?;
    let gzipped = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if gzipped {
        parse_catalog(GzDecoder::new(BufReader::new(file)))
    } else {
        parse_catalog(BufReader::new(file))
    }
}

/// Parses CSV rows into raw records, keeping source order
pub fn parse_catalog<R: Read>(reader: R) -> AppResult<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let title_col = column(TITLE_COLUMN).ok_or_else(|| missing_column(TITLE_COLUMN))?;
    let genres_col = column(GENRES_COLUMN).ok_or_else(|| missing_column(GENRES_COLUMN))?;
    let rating_col = column(RATING_COLUMN);
    if rating_col.is_none() {
        tracing::warn!("Catalog has no vote_average column; all ratings unknown");
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(RawRecord {
            title: cell(&row, Some(title_col)),
            genres: cell(&row, Some(genres_col)),
            vote_average: cell(&row, rating_col),
        });
    }

    Ok(records)
}

fn missing_column(name: &str) -> AppError {
    AppError::Catalog(format!("missing required column '{}'", name))
}

/// Cell value, with absent and empty cells both mapped to `None`
fn cell(row: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|idx| row.get(idx))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    const SAMPLE: &str = "\
id,title,genres,vote_average
1,Toy Story,\"[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]\",7.7
2,Jumanji,\"[{'id': 12, 'name': 'Adventure'}]\",
3,,\"[{'id': 18, 'name': 'Drama'}]\",6.1
4,Heat,,7.7
";

    #[test]
    fn test_parse_catalog() {
        let records = parse_catalog(SAMPLE.as_bytes()).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].title.as_deref(), Some("Toy Story"));
        assert_eq!(
            records[0].genres.as_deref(),
            Some("[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]")
        );
        assert_eq!(records[0].vote_average.as_deref(), Some("7.7"));
        assert_eq!(records[1].vote_average, None);
        assert_eq!(records[2].title, None);
        assert_eq!(records[3].genres, None);
    }

    #[test]
    fn test_rating_column_is_optional() {
        let csv = "title,genres\nHeat,\"[{'name': 'Crime'}]\"\n";
        let records = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vote_average, None);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let csv = "title,genres,vote_average\nHeat\n";
        let records = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(records[0].title.as_deref(), Some("Heat"));
        assert_eq!(records[0].genres, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "name,genres\nHeat,[]\n";
        match parse_catalog(csv.as_bytes()) {
            Err(AppError::Catalog(msg)) => assert!(msg.contains("title")),
            other => panic!("expected Catalog error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_plain_and_gzip_files() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("movies.csv");
        std::fs::write(&plain, SAMPLE).unwrap();
        assert_eq!(read_catalog(&plain).unwrap().len(), 4);

        let gz = dir.path().join("movies.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_catalog(&gz).unwrap(), read_catalog(&plain).unwrap());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvCatalogSource::new("/nonexistent/catalog.csv");
        let result = tokio_test::block_on(source.load());
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
