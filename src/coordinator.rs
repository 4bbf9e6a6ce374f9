//! Per-dataset download pipeline.
//!
//! The coordinator takes one discovered record and drives it to a final
//! status: checks for already-present content, downloads with retry, writes
//! metadata on success, and cleans up partial content on failure. It never
//! returns an error for a single broken dataset; failures are recorded on
//! the record itself so the ingestion loop keeps moving.

use crate::platform::PlatformClient;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::storage::{BlobStore, MetadataStore};
use crate::{DatasetRecord, IngestionStatus};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Content was fetched from the platform (false when already present)
    pub downloaded: bool,
    /// Metadata document was written
    pub metadata_saved: bool,
    /// A final decision was reached and the record must be marked processed.
    /// True on every path, failures included: abandoned records are never
    /// reconsidered.
    pub processed: bool,
}

/// Drives one dataset from discovery to a final ingestion status.
pub struct DownloadCoordinator {
    client: Arc<dyn PlatformClient>,
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    retry: RetryPolicy,
    extract: bool,
}

impl DownloadCoordinator {
    /// Create a coordinator over the given client and stores.
    pub fn new(
        client: Arc<dyn PlatformClient>,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        retry: RetryPolicy,
        extract: bool,
    ) -> Self {
        Self {
            client,
            blobs,
            metadata,
            retry,
            extract,
        }
    }

    /// Process one record to completion, mutating its bookkeeping fields.
    ///
    /// The record always ends in a final status (`Completed` or `Failed`);
    /// the caller marks it processed either way so a permanently broken
    /// dataset is not retried on every poll.
    pub async fn process(&self, record: &mut DatasetRecord) -> ProcessOutcome {
        record.ingestion_timestamp = Some(Utc::now());

        if self.blobs.exists(&record.dataset_ref).await {
            info!(dataset_ref = %record.dataset_ref, "content already present, skipping download");
            record.ingestion_status = IngestionStatus::Completed;
            record.local_path = Some(self.blobs.dataset_path(&record.dataset_ref));
            let metadata_saved = self.save_metadata(record).await;
            return ProcessOutcome {
                downloaded: false,
                metadata_saved,
                processed: true,
            };
        }

        record.ingestion_status = IngestionStatus::Downloading;
        match self.download_with_retry(record).await {
            Ok(()) => {
                record.ingestion_status = IngestionStatus::Completed;
                record.local_path = Some(self.blobs.dataset_path(&record.dataset_ref));
                record.error_message = None;
                info!(dataset_ref = %record.dataset_ref, "download completed");
                let metadata_saved = self.save_metadata(record).await;
                ProcessOutcome {
                    downloaded: true,
                    metadata_saved,
                    processed: true,
                }
            }
            Err(message) => {
                record.ingestion_status = IngestionStatus::Failed;
                record.error_message = Some(message.clone());
                error!(dataset_ref = %record.dataset_ref, error = %message, "download abandoned");
                if let Err(e) = self.blobs.cleanup_partial(&record.dataset_ref).await {
                    warn!(
                        dataset_ref = %record.dataset_ref,
                        error = %e,
                        "failed to clean up partial download"
                    );
                }
                ProcessOutcome {
                    downloaded: false,
                    metadata_saved: false,
                    processed: true,
                }
            }
        }
    }

    async fn download_with_retry(&self, record: &DatasetRecord) -> Result<(), String> {
        let dest = self.blobs.dataset_path(&record.dataset_ref);
        let mut attempt = 1u32;
        loop {
            match self
                .client
                .download(&record.dataset_ref, &dest, self.extract)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => match self.retry.decide(attempt, e.failure_kind()) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            dataset_ref = %record.dataset_ref,
                            attempt = attempt,
                            delay_secs = delay.as_secs_f64(),
                            error = %e,
                            "download attempt failed, will retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        return Err(format!("giving up after attempt {attempt}: {e}"));
                    }
                    RetryDecision::Fatal => {
                        return Err(format!("unretryable failure: {e}"));
                    }
                },
            }
        }
    }

    async fn save_metadata(&self, record: &DatasetRecord) -> bool {
        match self.metadata.save(record).await {
            Ok(()) => true,
            Err(e) => {
                // Content is on disk either way; losing one metadata document
                // is not worth failing the whole item over.
                error!(dataset_ref = %record.dataset_ref, error = %e, "failed to save metadata");
                false
            }
        }
    }
}
