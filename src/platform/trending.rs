//! Trending approximation as a client decorator.
//!
//! Some platforms expose no "trending" feed. This decorator approximates one
//! by over-fetching the recent listing and keeping only datasets that are
//! both fresh (updated within a recency window) and popular (download count
//! above a threshold). It wraps any [`PlatformClient`] and is transparent to
//! the orchestrator.

use crate::config::TrendingConfig;
use crate::identifier::DatasetRef;
use crate::platform::{PlatformClient, PlatformResult};
use crate::DatasetRecord;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::path::Path;
use tracing::{debug, info};

/// Over-fetch multiplier: the post-filter discards most records, so ask the
/// platform for more than the caller wants.
const FETCH_MULTIPLIER: usize = 10;

/// Recency + popularity post-filter over a platform client.
pub struct TrendingFilter<C> {
    inner: C,
    recency_window: ChronoDuration,
    min_downloads: u64,
}

impl<C: PlatformClient> TrendingFilter<C> {
    /// Wrap `inner` with the given filter parameters.
    pub fn new(inner: C, config: &TrendingConfig) -> Self {
        Self {
            inner,
            recency_window: ChronoDuration::days(config.recency_window_days),
            min_downloads: config.min_downloads,
        }
    }

    /// Access the wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: PlatformClient> PlatformClient for TrendingFilter<C> {
    async fn authenticate(&self) -> PlatformResult<()> {
        self.inner.authenticate().await
    }

    async fn list_recent(
        &self,
        max_count: usize,
        page: usize,
    ) -> PlatformResult<Vec<DatasetRecord>> {
        let fetch_limit = max_count.saturating_mul(FETCH_MULTIPLIER);
        let candidates = self.inner.list_recent(fetch_limit, page).await?;
        let fetched = candidates.len();

        let cutoff = Utc::now() - self.recency_window;
        let mut kept = Vec::with_capacity(max_count);
        for record in candidates {
            if record.last_updated < cutoff {
                continue;
            }
            if record.download_count < self.min_downloads {
                debug!(
                    dataset_ref = %record.dataset_ref,
                    downloads = record.download_count,
                    "dropped below popularity threshold"
                );
                continue;
            }
            kept.push(record);
            if kept.len() >= max_count {
                break;
            }
        }

        info!(
            kept = kept.len(),
            fetched = fetched,
            "trending filter applied to listing"
        );
        Ok(kept)
    }

    async fn download(
        &self,
        dataset_ref: &DatasetRef,
        dest: &Path,
        extract: bool,
    ) -> PlatformResult<()> {
        self.inner.download(dataset_ref, dest, extract).await
    }

    fn platform_name(&self) -> &str {
        self.inner.platform_name()
    }
}
