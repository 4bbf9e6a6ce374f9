//! Ingestion engine configuration
//!
//! A single value object constructed once by the bootstrap layer and passed
//! into each component's constructor. The core never reads flags, environment
//! variables, or global state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry parameters for platform operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay for each further attempt (> 1.0)
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 4_000,
            backoff_factor: 2.0,
        }
    }
}

/// Trending post-filter parameters (see [`crate::platform::TrendingFilter`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    /// Only keep datasets updated within this many days
    pub recency_window_days: i64,
    /// Only keep datasets with at least this many downloads
    pub min_downloads: u64,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            recency_window_days: 7,
            min_downloads: 100,
        }
    }
}

/// Top-level configuration for the ingestion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Seconds between poll cycles
    pub poll_interval_secs: u64,
    /// Seconds to wait before the next poll after a failed listing call
    /// (deliberately shorter than the normal interval)
    pub poll_retry_delay_secs: u64,
    /// Maximum datasets requested per poll
    pub max_datasets_per_poll: usize,
    /// Minimum milliseconds between outbound platform calls (0 disables)
    pub min_request_interval_ms: u64,
    /// Whether to ask the platform client to extract archives after download
    pub extract_archives: bool,
    /// Retry parameters for downloads
    pub retry: RetryConfig,
    /// Optional trending post-filter; `None` ingests everything listed
    pub trending: Option<TrendingConfig>,
    /// Directory for downloaded dataset content
    pub data_dir: PathBuf,
    /// Directory for per-dataset metadata JSON files
    pub metadata_dir: PathBuf,
    /// Directory for the durable tracking state
    pub state_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            poll_retry_delay_secs: 60,
            max_datasets_per_poll: 100,
            min_request_interval_ms: 1_000,
            extract_archives: true,
            retry: RetryConfig::default(),
            trending: None,
            data_dir: PathBuf::from("data/datasets"),
            metadata_dir: PathBuf::from("data/metadata"),
            state_dir: PathBuf::from("data/state"),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing fields fall back to the defaults, so a partial file is valid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs < 1 {
            return Err(ConfigError::Invalid(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        if self.poll_interval_secs > 86_400 {
            return Err(ConfigError::Invalid(
                "poll interval cannot exceed 24 hours".to_string(),
            ));
        }
        if self.retry.max_attempts < 1 {
            return Err(ConfigError::Invalid(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_factor <= 1.0 {
            return Err(ConfigError::Invalid(
                "backoff factor must be greater than 1.0".to_string(),
            ));
        }
        if self.max_datasets_per_poll == 0 {
            return Err(ConfigError::Invalid(
                "max datasets per poll must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Post-failure poll delay as a [`Duration`]
    pub fn poll_retry_delay(&self) -> Duration {
        Duration::from_secs(self.poll_retry_delay_secs)
    }

    /// Minimum spacing between platform calls as a [`Duration`]
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Configuration errors. All of these are fatal at bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read configuration file {path}: {source}")]
    Unreadable {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON
    #[error("cannot parse configuration file {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// A configuration value violates a constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
