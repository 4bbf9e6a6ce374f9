//! Filesystem-backed metadata storage.
//!
//! One JSON document per dataset in a flat directory. Filenames are
//! `{platform}_{owner}__{name}.json`: the platform prefix prevents
//! collisions between platforms, and the double-underscore keeps the
//! namespace flat.

use crate::identifier::DatasetRef;
use crate::storage::{MetadataStore, StorageError, StorageResult};
use crate::DatasetRecord;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    root: PathBuf,
}

impl FsMetadataStore {
    /// Create a metadata store, ensuring the root directory exists.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            path: root.clone(),
            source: e,
        })?;
        debug!(root = %root.display(), "metadata store initialized");
        Ok(Self { root })
    }

    /// Path of the metadata document for a dataset on a platform.
    pub fn metadata_path(&self, platform: &str, dataset_ref: &DatasetRef) -> PathBuf {
        self.root
            .join(format!("{platform}_{}.json", dataset_ref.to_file_stem()))
    }

    /// Whether a metadata document already exists.
    pub fn metadata_exists(&self, platform: &str, dataset_ref: &DatasetRef) -> bool {
        self.metadata_path(platform, dataset_ref).is_file()
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MetadataStore for FsMetadataStore {
    async fn save(&self, record: &DatasetRecord) -> StorageResult<()> {
        let path = self.metadata_path(&record.platform, &record.dataset_ref);
        let json = serde_json::to_string_pretty(record)?;

        // Write-then-rename so a crash never leaves a truncated document.
        let mut staging =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|e| StorageError::Io {
                path: self.root.clone(),
                source: e,
            })?;
        staging
            .write_all(json.as_bytes())
            .map_err(|e| StorageError::Io {
                path: path.clone(),
                source: e,
            })?;
        staging.persist(&path).map_err(|e| StorageError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        debug!(dataset_ref = %record.dataset_ref, path = %path.display(), "metadata saved");
        Ok(())
    }
}
