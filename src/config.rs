use serde::Deserialize;
use std::path::PathBuf;

use crate::recommender::{EmbedderKind, HybridWeights, ScoringOptions, TAG_WEIGHTS};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; in-memory storage when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the place metadata cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// HS256 secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime in hours
    #[serde(default = "default_jwt_ttl_hours")]
    pub jwt_ttl_hours: i64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Place table (CSV with header)
    #[serde(default = "default_places_csv")]
    pub places_csv: PathBuf,

    /// Embedding matrix (CSV, one row per place, no header)
    #[serde(default = "default_embeddings_csv")]
    pub embeddings_csv: PathBuf,

    /// Query encoder, `hash` or `fastembed`
    #[serde(default = "default_embedder")]
    pub embedder: EmbedderKind,

    /// Output dimension of the hash encoder
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,

    #[serde(default = "default_tag_weight")]
    pub tag_weight: f32,

    /// Results returned when a request does not ask for a count
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Upper bound on requested result counts
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Embed a phrase built from tags when a query has no free text
    #[serde(default = "default_synthesize_query_text")]
    pub synthesize_query_text: bool,
}

fn default_jwt_ttl_hours() -> i64 {
    24
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_places_csv() -> PathBuf {
    PathBuf::from("data/places.csv")
}

fn default_embeddings_csv() -> PathBuf {
    PathBuf::from("data/place_embeddings.csv")
}

fn default_embedder() -> EmbedderKind {
    EmbedderKind::Hash
}

fn default_embedding_dim() -> usize {
    384
}

fn default_similarity_weight() -> f32 {
    HybridWeights::REFERENCE.similarity
}

fn default_tag_weight() -> f32 {
    HybridWeights::REFERENCE.tag
}

fn default_top_k() -> usize {
    3
}

fn default_max_top_k() -> usize {
    50
}

fn default_synthesize_query_text() -> bool {
    true
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

    /// Load configuration from explicit key/value pairs
    pub fn from_pairs<I>(pairs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if self.jwt_ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }
        if self.default_top_k == 0 {
            anyhow::bail!("DEFAULT_TOP_K must be at least 1");
        }
        if self.max_top_k < self.default_top_k {
            anyhow::bail!(
                "MAX_TOP_K ({}) must not be below DEFAULT_TOP_K ({})",
                self.max_top_k,
                self.default_top_k
            );
        }
        self.hybrid_weights()?;
        Ok(())
    }

    pub fn hybrid_weights(&self) -> anyhow::Result<HybridWeights> {
        Ok(HybridWeights::new(self.similarity_weight, self.tag_weight)?)
    }

    /// Scoring options for the recommender
    pub fn scoring_options(&self) -> anyhow::Result<ScoringOptions> {
        Ok(ScoringOptions {
            weights: self.hybrid_weights()?,
            tag_weights: TAG_WEIGHTS,
            synthesize_text: self.synthesize_query_text,
        })
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply() {
        let config = Config::from_pairs(pairs(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 5000);
        assert_eq!(config.embedder, EmbedderKind::Hash);
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.hybrid_weights().unwrap(), HybridWeights::REFERENCE);
        assert!(config.synthesize_query_text);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides_are_read() {
        let config = Config::from_pairs(pairs(&[
            ("JWT_SECRET", "s3cret"),
            ("EMBEDDER", "fastembed"),
            ("SIMILARITY_WEIGHT", "0"),
            ("TAG_WEIGHT", "1"),
            ("PORT", "8080"),
            ("SYNTHESIZE_QUERY_TEXT", "false"),
        ]))
        .unwrap();
        assert_eq!(config.embedder, EmbedderKind::Fastembed);
        assert_eq!(config.port, 8080);
        assert_eq!(config.hybrid_weights().unwrap().tag, 1.0);
        assert!(!config.scoring_options().unwrap().synthesize_text);
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(Config::from_pairs(pairs(&[])).is_err());
    }

    #[test]
    fn test_negative_weight_fails() {
        let result = Config::from_pairs(pairs(&[
            ("JWT_SECRET", "s3cret"),
            ("TAG_WEIGHT", "-0.5"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_top_k_bounds_are_checked() {
        let result = Config::from_pairs(pairs(&[
            ("JWT_SECRET", "s3cret"),
            ("DEFAULT_TOP_K", "10"),
            ("MAX_TOP_K", "5"),
        ]));
        assert!(result.is_err());
    }
}
