//! Processed-set tracking for deduplication.
//!
//! Pure in-memory structure with O(1) membership tests; rebuilt from the
//! persisted state at startup. During normal operation the set only grows.

use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Tracks which datasets have already been ingested.
#[derive(Debug, Default)]
pub struct Tracker {
    processed: HashSet<String>,
}

impl Tracker {
    /// Create a tracker with an empty processed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a dataset has not been processed yet.
    pub fn is_new(&self, dataset_ref: &str) -> bool {
        !self.processed.contains(dataset_ref)
    }

    /// Mark a dataset as processed. Idempotent.
    pub fn mark_processed(&mut self, dataset_ref: impl Into<String>) {
        let dataset_ref = dataset_ref.into();
        if !self.processed.insert(dataset_ref.clone()) {
            warn!(dataset_ref = %dataset_ref, "dataset already marked as processed");
        } else {
            debug!(dataset_ref = %dataset_ref, "marked as processed");
        }
    }

    /// Copy of the full processed set, for persistence.
    pub fn snapshot(&self) -> HashSet<String> {
        self.processed.clone()
    }

    /// Replace the current set with previously persisted references.
    ///
    /// Used once at startup to rebuild tracking state.
    pub fn restore(&mut self, dataset_refs: HashSet<String>) {
        info!(count = dataset_refs.len(), "restored processed set");
        self.processed = dataset_refs;
    }

    /// Number of processed datasets.
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    /// Whether nothing has been processed yet.
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
