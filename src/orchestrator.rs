//! The continuous ingestion loop.
//!
//! The orchestrator cycles through poll, filter, process, persist, and wait
//! phases until shutdown is requested. Each phase has a cooperative shutdown
//! check point; in-flight downloads are never aborted, and state is persisted
//! once more before the loop unwinds.

use crate::config::IngestConfig;
use crate::coordinator::DownloadCoordinator;
use crate::platform::{PlatformClient, PlatformError, TrendingFilter};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::shutdown::SharedShutdown;
use crate::state::{IngestState, StateError, StateManager, Statistics};
use crate::storage::{BlobStore, MetadataStore};
use crate::tracker::Tracker;
use crate::IngestionStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Phase of the ingestion loop, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Requesting the recent listing from the platform
    Polling,
    /// Dropping already-processed datasets from the listing
    Filtering,
    /// Downloading fresh datasets one at a time
    Processing,
    /// Writing the durable state snapshot
    Persisting,
    /// Sleeping until the next poll cycle
    Waiting,
    /// Shutdown requested, performing the final persist
    ShuttingDown,
    /// Loop has unwound
    Stopped,
}

/// Summary of one completed poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records returned by the platform listing
    pub fetched: usize,
    /// Records that survived deduplication
    pub fresh: usize,
    /// Fresh records that ended `Completed`
    pub succeeded: usize,
    /// Fresh records that ended `Failed`
    pub failed: usize,
}

/// Runs the poll/filter/process/persist/wait loop.
pub struct Orchestrator {
    config: IngestConfig,
    client: Arc<dyn PlatformClient>,
    coordinator: DownloadCoordinator,
    tracker: Tracker,
    rate_limiter: RateLimiter,
    state_manager: StateManager,
    shutdown: SharedShutdown,
    statistics: Statistics,
    phase: Phase,
    created_at: DateTime<Utc>,
    base_uptime_secs: u64,
    started_at: Instant,
}

impl Orchestrator {
    /// Build an orchestrator, loading any previously persisted state.
    ///
    /// The trending post-filter is applied here when configured, so the rest
    /// of the loop sees a plain [`PlatformClient`].
    ///
    /// # Errors
    ///
    /// Fails only when the state directory itself is unusable.
    pub fn new(
        config: IngestConfig,
        client: Arc<dyn PlatformClient>,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        shutdown: SharedShutdown,
    ) -> Result<Self, StateError> {
        let client: Arc<dyn PlatformClient> = match &config.trending {
            Some(trending) => Arc::new(TrendingFilter::new(client, trending)),
            None => client,
        };

        let state_manager = StateManager::new(&config.state_dir)?;
        let state = state_manager.load();

        let mut tracker = Tracker::new();
        tracker.restore(state.processed_set());

        let coordinator = DownloadCoordinator::new(
            client.clone(),
            blobs,
            metadata,
            RetryPolicy::from_config(&config.retry),
            config.extract_archives,
        );
        let rate_limiter = RateLimiter::new(config.min_request_interval());

        Ok(Self {
            config,
            client,
            coordinator,
            tracker,
            rate_limiter,
            state_manager,
            shutdown,
            base_uptime_secs: state.statistics.uptime_seconds,
            created_at: state.metadata.created_at,
            statistics: state.statistics,
            phase: Phase::Stopped,
            started_at: Instant::now(),
        })
    }

    /// Current loop phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Running counters, including values restored from persisted state.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Run until shutdown is requested.
    ///
    /// Authenticates once, then loops. Every poll cycle failure, expired
    /// credentials included, is logged and retried after a short delay
    /// rather than the full interval; the service must outlive transient
    /// platform trouble unattended.
    ///
    /// # Errors
    ///
    /// Propagates a failure of the initial authentication.
    pub async fn run(&mut self) -> Result<(), PlatformError> {
        info!(
            platform = self.client.platform_name(),
            poll_interval_secs = self.config.poll_interval_secs,
            already_processed = self.tracker.len(),
            "ingestion service starting"
        );
        self.client.authenticate().await?;

        while !self.shutdown.is_requested() {
            match self.poll_once().await {
                Ok(report) => {
                    info!(
                        fetched = report.fetched,
                        fresh = report.fresh,
                        succeeded = report.succeeded,
                        failed = report.failed,
                        "poll cycle completed"
                    );
                    self.wait_before_next_poll(self.config.poll_interval()).await;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_delay_secs = self.config.poll_retry_delay_secs,
                        "poll cycle failed, will retry sooner than the normal interval"
                    );
                    self.wait_before_next_poll(self.config.poll_retry_delay()).await;
                }
            }
        }

        self.final_persist();
        info!(
            total_processed = self.statistics.total_processed,
            total_polls = self.statistics.total_polls,
            "ingestion service stopped"
        );
        Ok(())
    }

    /// Execute one poll cycle: list, filter, process, persist.
    ///
    /// Re-running a cycle over the same listing is a no-op thanks to the
    /// tracker. A shutdown request interrupts the cycle between datasets,
    /// never in the middle of one.
    ///
    /// # Errors
    ///
    /// Returns the platform error when the listing call fails; per-dataset
    /// download failures are absorbed into the cycle report instead.
    pub async fn poll_once(&mut self) -> Result<CycleReport, PlatformError> {
        self.set_phase(Phase::Polling);
        tokio::select! {
            biased;
            _ = self.shutdown.notified() => return Ok(CycleReport::default()),
            _ = self.rate_limiter.wait_if_needed() => {}
        }

        let listed = self
            .client
            .list_recent(self.config.max_datasets_per_poll, 1)
            .await?;
        let fetched = listed.len();

        self.set_phase(Phase::Filtering);
        let fresh_records: Vec<_> = listed
            .into_iter()
            .filter(|record| self.tracker.is_new(&record.dataset_ref.to_string()))
            .collect();
        let fresh = fresh_records.len();
        debug!(fetched = fetched, fresh = fresh, "listing deduplicated");

        self.set_phase(Phase::Processing);
        let mut succeeded = 0;
        let mut failed = 0;
        for mut record in fresh_records {
            if self.shutdown.is_requested() {
                info!("shutdown requested, stopping cycle between datasets");
                break;
            }

            let outcome = self.coordinator.process(&mut record).await;

            // Marked processed even on failure: retries are exhausted by the
            // coordinator, and reattempting a broken dataset on every poll
            // would stall ingestion of everything behind it.
            if outcome.processed {
                self.tracker.mark_processed(record.dataset_ref.to_string());
                self.statistics.total_processed += 1;
                if record.ingestion_status == IngestionStatus::Completed {
                    self.statistics.successful_downloads += 1;
                    succeeded += 1;
                } else {
                    self.statistics.failed_downloads += 1;
                    failed += 1;
                }
            }
        }

        self.set_phase(Phase::Persisting);
        self.statistics.total_polls += 1;
        self.statistics.last_poll_timestamp = Some(Utc::now());
        self.statistics.uptime_seconds =
            self.base_uptime_secs + self.started_at.elapsed().as_secs();
        self.persist_state();

        Ok(CycleReport {
            fetched,
            fresh,
            succeeded,
            failed,
        })
    }

    async fn wait_before_next_poll(&mut self, delay: Duration) {
        self.set_phase(Phase::Waiting);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.shutdown.notified() => {}
        }
    }

    fn final_persist(&mut self) {
        self.set_phase(Phase::ShuttingDown);
        self.statistics.uptime_seconds =
            self.base_uptime_secs + self.started_at.elapsed().as_secs();
        self.persist_state();
        self.set_phase(Phase::Stopped);
    }

    fn persist_state(&self) {
        let state = IngestState::snapshot(
            self.tracker.snapshot(),
            self.statistics.clone(),
            self.created_at,
        );
        // A failed save is logged, not fatal: the in-memory tracker still
        // holds the full set and the next cycle will try again.
        if let Err(e) = self.state_manager.save(&state) {
            error!(error = %e, "failed to persist tracking state");
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "phase transition");
            self.phase = phase;
        }
    }
}
