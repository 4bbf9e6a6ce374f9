//! Filesystem-backed blob storage.
//!
//! Content lives under `root/owner/name/`, derived deterministically from
//! the dataset reference.

use crate::identifier::DatasetRef;
use crate::storage::{BlobStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a blob store, ensuring the root directory exists.
    ///
    /// # Errors
    ///
    /// An unwritable root is fatal at bootstrap.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            path: root.clone(),
            source: e,
        })?;
        debug!(root = %root.display(), "blob store initialized");
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Total size in bytes of a dataset's downloaded content.
    pub fn dataset_size(&self, dataset_ref: &DatasetRef) -> u64 {
        fn dir_size(path: &Path) -> u64 {
            let Ok(entries) = std::fs::read_dir(path) else {
                return 0;
            };
            entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        dir_size(&path)
                    } else {
                        entry.metadata().map(|m| m.len()).unwrap_or(0)
                    }
                })
                .sum()
        }
        dir_size(&self.dataset_path(dataset_ref))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn dataset_path(&self, dataset_ref: &DatasetRef) -> PathBuf {
        self.root.join(dataset_ref.owner()).join(dataset_ref.name())
    }

    async fn exists(&self, dataset_ref: &DatasetRef) -> bool {
        let path = self.dataset_path(dataset_ref);
        match tokio::fs::read_dir(&path).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
            Err(_) => false,
        }
    }

    async fn cleanup_partial(&self, dataset_ref: &DatasetRef) -> StorageResult<()> {
        let path = self.dataset_path(dataset_ref);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!(dataset_ref = %dataset_ref, "cleaned up partial download");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }
}
