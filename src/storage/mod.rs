//! Blob and metadata storage abstractions.
//!
//! The ingestion core depends only on the [`BlobStore`] and [`MetadataStore`]
//! traits; [`FsBlobStore`] and [`FsMetadataStore`] are the filesystem-backed
//! implementations used in production.

use crate::identifier::DatasetRef;
use crate::DatasetRecord;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod blob;
pub mod metadata;

pub use blob::FsBlobStore;
pub use metadata::FsMetadataStore;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path the operation touched
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage for downloaded dataset content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Deterministic local path for a dataset's content.
    fn dataset_path(&self, dataset_ref: &DatasetRef) -> PathBuf;

    /// Whether the dataset's content is already present locally.
    ///
    /// An existing but empty directory does not count: a crash between
    /// directory creation and the first written byte must not look like a
    /// completed download.
    async fn exists(&self, dataset_ref: &DatasetRef) -> bool;

    /// Remove partially written content left behind by a failed download.
    async fn cleanup_partial(&self, dataset_ref: &DatasetRef) -> StorageResult<()>;
}

/// Storage for per-dataset metadata documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist the record's metadata.
    async fn save(&self, record: &DatasetRecord) -> StorageResult<()>;
}
