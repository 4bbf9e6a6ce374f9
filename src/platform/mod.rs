//! Platform client abstraction.
//!
//! One implementation exists per hosting platform (Kaggle, Hugging Face, ...).
//! The orchestrator depends only on the [`PlatformClient`] trait; wire
//! protocol and authentication details live entirely in the implementations.

use crate::identifier::DatasetRef;
use crate::retry::FailureKind;
use crate::DatasetRecord;
use async_trait::async_trait;
use std::path::Path;

pub mod trending;

pub use trending::TrendingFilter;

/// Platform API errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Bad or missing credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transient network failure
    #[error("network error: {0}")]
    Network(String),

    /// The platform rejected the call for rate limiting
    #[error("rate limited by platform")]
    RateLimited,

    /// The dataset does not exist or is permanently inaccessible
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// The platform returned something unparseable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// Classify this error for the retry policy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PlatformError::Auth(_) => FailureKind::Fatal,
            PlatformError::Network(_) | PlatformError::RateLimited => FailureKind::Transient,
            PlatformError::NotFound(_) | PlatformError::InvalidResponse(_) => {
                FailureKind::Permanent
            }
        }
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Client for one dataset-hosting platform.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Authenticate with the platform.
    ///
    /// # Errors
    ///
    /// [`PlatformError::Auth`] on bad or missing credentials; this is fatal
    /// and surfaced to the bootstrap layer.
    async fn authenticate(&self) -> PlatformResult<()>;

    /// List recently updated datasets, most relevant first.
    ///
    /// Returns at most `max_count` records. The returned order is meaningful
    /// and preserved by the orchestrator.
    async fn list_recent(&self, max_count: usize, page: usize)
        -> PlatformResult<Vec<DatasetRecord>>;

    /// Download a dataset's content into `dest`.
    ///
    /// `extract` asks the client to unpack archives after download where the
    /// platform delivers compressed content.
    async fn download(&self, dataset_ref: &DatasetRef, dest: &Path, extract: bool)
        -> PlatformResult<()>;

    /// Platform name used to namespace persisted metadata filenames.
    fn platform_name(&self) -> &str;
}

#[async_trait]
impl<T: PlatformClient + ?Sized> PlatformClient for std::sync::Arc<T> {
    async fn authenticate(&self) -> PlatformResult<()> {
        (**self).authenticate().await
    }

    async fn list_recent(
        &self,
        max_count: usize,
        page: usize,
    ) -> PlatformResult<Vec<DatasetRecord>> {
        (**self).list_recent(max_count, page).await
    }

    async fn download(
        &self,
        dataset_ref: &DatasetRef,
        dest: &Path,
        extract: bool,
    ) -> PlatformResult<()> {
        (**self).download(dataset_ref, dest, extract).await
    }

    fn platform_name(&self) -> &str {
        (**self).platform_name()
    }
}
