//! Shared fixtures for integration tests.

use async_trait::async_trait;
use chrono::Utc;
use dataset_ingest::config::IngestConfig;
use dataset_ingest::identifier::DatasetRef;
use dataset_ingest::orchestrator::Orchestrator;
use dataset_ingest::platform::{PlatformClient, PlatformError, PlatformResult};
use dataset_ingest::shutdown::SharedShutdown;
use dataset_ingest::storage::{BlobStore, FsBlobStore, FsMetadataStore, MetadataStore};
use dataset_ingest::DatasetRecord;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// How a scripted download should fail.
#[derive(Debug, Clone, Copy)]
pub enum DownloadScript {
    /// Fail with a transient network error this many times, then succeed.
    FlakyTimes(u32),
    /// Fail with a transient network error on every attempt.
    AlwaysFlaky,
    /// Fail with a not-found error on the first attempt.
    Missing,
}

/// Platform client with scripted listings and download behavior.
///
/// Each call to `list_recent` consumes the next scripted listing; once the
/// script runs out the platform reports nothing new. Downloads succeed by
/// writing a marker file into the destination unless scripted otherwise.
pub struct MockPlatform {
    listings: Mutex<VecDeque<Vec<DatasetRecord>>>,
    scripts: Mutex<HashMap<String, DownloadScript>>,
    download_calls: Mutex<Vec<String>>,
    list_calls: Mutex<u32>,
    expired: AtomicBool,
}

impl MockPlatform {
    pub fn new(listings: Vec<Vec<DatasetRecord>>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            scripts: Mutex::new(HashMap::new()),
            download_calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
            expired: AtomicBool::new(false),
        }
    }

    /// Make every subsequent listing call fail with an authentication error,
    /// as if the credentials expired after startup.
    pub fn expire_credentials(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn script_download(&self, reference: &str, script: DownloadScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(reference.to_string(), script);
    }

    /// Every download attempt so far, in order, as `owner/name` strings.
    pub fn download_calls(&self) -> Vec<String> {
        self.download_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> u32 {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn authenticate(&self) -> PlatformResult<()> {
        Ok(())
    }

    async fn list_recent(
        &self,
        max_count: usize,
        _page: usize,
    ) -> PlatformResult<Vec<DatasetRecord>> {
        *self.list_calls.lock().unwrap() += 1;
        if self.expired.load(Ordering::SeqCst) {
            return Err(PlatformError::Auth("token expired".into()));
        }
        let mut listings = self.listings.lock().unwrap();
        let listing = listings.pop_front().unwrap_or_default();
        Ok(listing.into_iter().take(max_count).collect())
    }

    async fn download(
        &self,
        dataset_ref: &DatasetRef,
        dest: &Path,
        _extract: bool,
    ) -> PlatformResult<()> {
        let reference = dataset_ref.to_string();
        self.download_calls.lock().unwrap().push(reference.clone());

        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&reference) {
                Some(DownloadScript::FlakyTimes(remaining)) if *remaining > 0 => {
                    *remaining -= 1;
                    Some(DownloadScript::AlwaysFlaky)
                }
                Some(DownloadScript::AlwaysFlaky) => Some(DownloadScript::AlwaysFlaky),
                Some(DownloadScript::Missing) => Some(DownloadScript::Missing),
                _ => None,
            }
        };
        match script {
            Some(DownloadScript::AlwaysFlaky | DownloadScript::FlakyTimes(_)) => {
                return Err(PlatformError::Network("connection reset".into()));
            }
            Some(DownloadScript::Missing) => {
                return Err(PlatformError::NotFound(reference));
            }
            None => {}
        }

        std::fs::create_dir_all(dest).map_err(|e| PlatformError::Network(e.to_string()))?;
        std::fs::write(dest.join("data.bin"), b"content")
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "mockhub"
    }
}

/// Configuration rooted under a test directory, with rate limiting off.
pub fn test_config(root: &Path) -> IngestConfig {
    IngestConfig {
        min_request_interval_ms: 0,
        data_dir: root.join("data"),
        metadata_dir: root.join("metadata"),
        state_dir: root.join("state"),
        ..Default::default()
    }
}

/// Wire an orchestrator over filesystem stores and the given mock platform.
pub fn orchestrator(
    config: IngestConfig,
    client: Arc<MockPlatform>,
    shutdown: SharedShutdown,
) -> Orchestrator {
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.data_dir).unwrap());
    let metadata: Arc<dyn MetadataStore> =
        Arc::new(FsMetadataStore::new(&config.metadata_dir).unwrap());
    Orchestrator::new(config, client, blobs, metadata, shutdown).unwrap()
}

/// A pending record for the given `owner/name` reference.
pub fn record(reference: &str) -> DatasetRecord {
    let dataset_ref = DatasetRef::parse(reference).unwrap();
    let mut record = DatasetRecord::new("mockhub", dataset_ref, reference, Utc::now());
    record.download_count = 1_000;
    record
}
