//! Engine configuration (`vinyl-match.toml`)
//!
//! Every section is optional. Values not present in the file keep their
//! defaults, so an empty or missing file yields a working configuration.

use crate::catalog::{DiscogsSettings, DISCOGS_API_BASE};
use crate::embeddings::{ConfidenceThresholds, DevicePreference, EmbeddingMatcher, RemoteEmbeddingSettings, ThresholdPreset, DEFAULT_TOP_K};
use crate::resolution::{ResolverSettings, ScoringWeights};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vinyl_common::config::{load_toml_config, resolve_secret, LoggingConfig};
use vinyl_common::{Error, Result};

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "vinyl-match.toml";

/// Environment variable holding the Discogs personal access token
pub const DISCOGS_TOKEN_ENV: &str = "DISCOGS_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub catalog: CatalogConfig,
    pub scoring: ScoringWeights,
    pub matching: MatchingConfig,
    pub embedding: EmbeddingConfig,
}

/// `[catalog]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Overrides the standard User-Agent
    pub user_agent: Option<String>,
    pub request_timeout_secs: u64,
    pub requests_per_minute: u32,
    pub detail_fetch_limit: usize,
    pub strong_match_score: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let resolver = ResolverSettings::default();
        Self {
            base_url: DISCOGS_API_BASE.to_string(),
            token: None,
            user_agent: None,
            request_timeout_secs: 20,
            requests_per_minute: 60,
            detail_fetch_limit: resolver.detail_fetch_limit,
            strong_match_score: resolver.strong_match_score,
        }
    }
}

impl CatalogConfig {
    /// Client settings with the token resolved from `DISCOGS_TOKEN` or TOML
    pub fn discogs_settings(&self) -> DiscogsSettings {
        DiscogsSettings {
            base_url: self.base_url.clone(),
            token: resolve_secret("Discogs token", DISCOGS_TOKEN_ENV, self.token.as_deref()),
            user_agent: self
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(vinyl_common::config::get_user_agent),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            requests_per_minute: self.requests_per_minute,
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            detail_fetch_limit: self.detail_fetch_limit,
            strong_match_score: self.strong_match_score,
        }
    }
}

/// `[matching]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub preset: ThresholdPreset,
    /// Overrides the preset's minimum score
    pub min_score: Option<f64>,
    /// Overrides the preset's minimum gap
    pub min_gap: Option<f64>,
    pub top_k: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            preset: ThresholdPreset::default(),
            min_score: None,
            min_gap: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> ConfidenceThresholds {
        let preset = self.preset.thresholds();
        ConfidenceThresholds {
            min_score: self.min_score.unwrap_or(preset.min_score),
            min_gap: self.min_gap.unwrap_or(preset.min_gap),
        }
    }

    pub fn matcher(&self) -> EmbeddingMatcher {
        EmbeddingMatcher::new(self.thresholds(), self.top_k)
    }
}

/// `[embedding]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub device: DevicePreference,
    /// Rotations embedded per cover during a rebuild
    pub rotations_deg: Vec<f32>,
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let remote = RemoteEmbeddingSettings::default();
        Self {
            endpoint: remote.endpoint,
            model: remote.model,
            device: remote.device,
            rotations_deg: vec![-5.0, 0.0, 5.0],
            request_timeout_secs: remote.request_timeout.as_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn remote_settings(&self) -> RemoteEmbeddingSettings {
        RemoteEmbeddingSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            device: self.device,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or defaults when absent, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = load_toml_config(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring
            .validate()
            .map_err(|e| Error::Config(format!("[scoring] {}", e)))?;

        let thresholds = self.matching.thresholds();
        if !(0.0..=1.0).contains(&thresholds.min_score) || !(0.0..=1.0).contains(&thresholds.min_gap) {
            return Err(Error::Config(format!(
                "[matching] thresholds must lie in 0..=1 (min_score {}, min_gap {})",
                thresholds.min_score, thresholds.min_gap
            )));
        }

        if self.catalog.request_timeout_secs == 0 || self.embedding.request_timeout_secs == 0 {
            return Err(Error::Config("request timeouts must be at least one second".to_string()));
        }

        Ok(())
    }
}
