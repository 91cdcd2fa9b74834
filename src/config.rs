use std::path::PathBuf;

use serde::Deserialize;

use crate::services::SimilarityStrategy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the catalog CSV, gzip-compressed when it ends in `.gz`
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// How pairwise similarity is computed and retained
    #[serde(default)]
    pub similarity_strategy: SimilarityStrategy,

    /// Number of recommendations returned when a query does not ask for a count
    #[serde(default = "default_results")]
    pub default_results: usize,

    /// Upper bound on the number of recommendations a single query may ask for
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings the serving layer needs to build models and answer queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub strategy: SimilarityStrategy,
    pub default_results: usize,
    pub max_results: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            strategy: SimilarityStrategy::default(),
            default_results: default_results(),
            max_results: default_max_results(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("compressed_data.csv.gz")
}

fn default_results() -> usize {
    5
}

fn default_max_results() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations the server cannot honour
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_results == 0 {
            anyhow::bail!("MAX_RESULTS must be at least 1");
        }
        if self.default_results > self.max_results {
            anyhow::bail!(
                "DEFAULT_RESULTS ({}) exceeds MAX_RESULTS ({})",
                self.default_results,
                self.max_results
            );
        }
        Ok(())
    }

    pub fn recommendation_settings(&self) -> RecommendationSettings {
        RecommendationSettings {
            strategy: self.similarity_strategy,
            default_results: self.default_results,
            max_results: self.max_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Config {
        envy::from_iter(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config.catalog_path, PathBuf::from("compressed_data.csv.gz"));
        assert_eq!(config.similarity_strategy, SimilarityStrategy::Lazy);
        assert_eq!(config.default_results, 5);
        assert_eq!(config.max_results, 50);
        assert_eq!(config.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CATALOG_PATH", "/data/movies.csv"),
            ("SIMILARITY_STRATEGY", "eager"),
            ("DEFAULT_RESULTS", "10"),
            ("PORT", "8080"),
        ]);
        assert_eq!(config.catalog_path, PathBuf::from("/data/movies.csv"));
        assert_eq!(config.similarity_strategy, SimilarityStrategy::Eager);

        let settings = config.recommendation_settings();
        assert_eq!(settings.default_results, 10);
        assert_eq!(settings.strategy, SimilarityStrategy::Eager);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_default_above_max_is_rejected() {
        let config = load(&[("DEFAULT_RESULTS", "20"), ("MAX_RESULTS", "10")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_is_rejected() {
        let config = load(&[("DEFAULT_RESULTS", "0"), ("MAX_RESULTS", "0")]);
        assert!(config.validate().is_err());
    }
}
