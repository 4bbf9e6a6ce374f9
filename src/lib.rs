//! # Dataset Ingestion Engine
//!
//! A long-running service that continuously discovers new datasets on a remote
//! content-hosting platform, downloads them locally, and records their metadata.
//! Designed to run unattended for long periods and survive crashes without
//! duplicating work or losing progress.
//!
//! ## Features
//!
//! - **Continuous Polling**: Configurable poll interval with graceful shutdown
//! - **Deduplication**: In-memory tracker rebuilt from durable state on startup
//! - **Crash-Safe State**: Atomic state writes with a backup generation fallback
//! - **Rate Limiting**: Minimum spacing between outbound platform calls
//! - **Retry with Backoff**: Exponential backoff with failure classification
//! - **Failure Isolation**: One broken dataset never stalls the ingestion loop
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`identifier`] - Dataset reference parsing and validation (owner/name)
//! - [`platform`] - Platform client abstraction and the trending post-filter
//! - [`tracker`] - Processed-set tracking for deduplication
//! - [`rate_limit`] - Minimum-interval rate limiting
//! - [`retry`] - Retry policy with exponential backoff
//! - [`state`] - Durable state persistence with crash safety
//! - [`storage`] - Blob and metadata storage abstractions
//! - [`coordinator`] - Per-dataset download pipeline
//! - [`orchestrator`] - The poll/filter/process/persist/wait state machine
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dataset_ingest::config::IngestConfig;
//! use dataset_ingest::orchestrator::Orchestrator;
//! use dataset_ingest::shutdown::Shutdown;
//! # use dataset_ingest::platform::PlatformClient;
//! # use dataset_ingest::storage::{BlobStore, MetadataStore};
//!
//! # async fn example(
//! #     client: Arc<dyn PlatformClient>,
//! #     blobs: Arc<dyn BlobStore>,
//! #     metadata: Arc<dyn MetadataStore>,
//! # ) -> anyhow::Result<()> {
//! let config = IngestConfig::default();
//! config.validate()?;
//!
//! let shutdown = Shutdown::shared();
//! let mut orchestrator = Orchestrator::new(config, client, blobs, metadata, shutdown)?;
//! orchestrator.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration value object for the ingestion engine
pub mod config;

/// Per-dataset download pipeline
pub mod coordinator;

/// Dataset reference parsing and validation
pub mod identifier;

/// Tracing subscriber setup
pub mod logging;

/// Poll/filter/process/persist/wait orchestration
pub mod orchestrator;

/// Platform client abstraction
pub mod platform;

/// Minimum-interval rate limiting
pub mod rate_limit;

/// Retry policy with exponential backoff
pub mod retry;

/// Graceful shutdown coordination shared across tasks
pub mod shutdown;

/// Durable state persistence
pub mod state;

/// Blob and metadata storage abstractions
pub mod storage;

/// Processed-set tracking
pub mod tracker;

// Re-export commonly used types
pub use identifier::DatasetRef;

/// Ingestion lifecycle status of a dataset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IngestionStatus {
    /// Discovered but not yet attempted
    #[default]
    #[serde(rename = "pending")]
    Pending,
    /// Download in progress
    #[serde(rename = "downloading")]
    Downloading,
    /// Downloaded (or already present) with metadata recorded
    #[serde(rename = "completed")]
    Completed,
    /// Download abandoned after retries were exhausted
    #[serde(rename = "failed")]
    Failed,
}

/// A dataset discovered on the remote platform.
///
/// Produced by a [`platform::PlatformClient`]; the ingestion bookkeeping
/// fields (`ingestion_status`, `ingestion_timestamp`, `local_path`,
/// `error_message`) start empty and are filled in by the
/// [`coordinator::DownloadCoordinator`] as the record moves through the
/// pipeline. Everything else is read-only platform metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetRecord {
    /// Source platform name (e.g., "kaggle", "huggingface")
    pub platform: String,
    /// Globally unique platform-qualified reference (owner/name)
    pub dataset_ref: DatasetRef,
    /// Human-readable title
    pub title: String,
    /// Owner account name
    pub owner: String,
    /// Total size in bytes as reported by the platform (0 if unknown)
    pub total_bytes: u64,
    /// Canonical URL on the platform
    pub url: String,
    /// Last-updated timestamp reported by the platform
    pub last_updated: DateTime<Utc>,
    /// Download counter reported by the platform
    pub download_count: u64,
    /// Vote/like counter reported by the platform
    pub vote_count: u64,
    /// Platform tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Ingestion status, updated by the download pipeline
    #[serde(default)]
    pub ingestion_status: IngestionStatus,
    /// When ingestion of this record started
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ingestion_timestamp: Option<DateTime<Utc>>,
    /// Local directory the content was downloaded to
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub local_path: Option<PathBuf>,
    /// Last error observed while processing this record
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl DatasetRecord {
    /// Create a record with empty ingestion bookkeeping.
    pub fn new(
        platform: impl Into<String>,
        dataset_ref: DatasetRef,
        title: impl Into<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let owner = dataset_ref.owner().to_string();
        Self {
            platform: platform.into(),
            dataset_ref,
            title: title.into(),
            owner,
            total_bytes: 0,
            url: String::new(),
            last_updated,
            download_count: 0,
            vote_count: 0,
            tags: Vec::new(),
            ingestion_status: IngestionStatus::Pending,
            ingestion_timestamp: None,
            local_path: None,
            error_message: None,
        }
    }
}
