//! Durable tracking state with crash-safe persistence.
//!
//! The state file is the single source of truth across restarts. Saves are
//! atomic (staging file + rename) and keep the previous generation as a
//! backup, so at any instant at least one of {canonical, backup} is a valid
//! snapshot produced by a completed save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current state schema version.
pub const STATE_VERSION: u32 = 1;

const STATE_FILE: &str = "tracking_state.json";
const BACKUP_FILE: &str = "tracking_state.json.backup";

/// Running counters for the ingestion service. Never decremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Statistics {
    /// Datasets for which a final decision was made
    pub total_processed: u64,
    /// Downloads that completed (or content that was already present)
    pub successful_downloads: u64,
    /// Downloads abandoned after retries were exhausted
    pub failed_downloads: u64,
    /// Completed poll cycles
    pub total_polls: u64,
    /// Cumulative service uptime in seconds
    pub uptime_seconds: u64,
    /// When the last poll cycle completed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_poll_timestamp: Option<DateTime<Utc>>,
}

/// Creation and modification timestamps of the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTimestamps {
    /// When the state was first created
    pub created_at: DateTime<Utc>,
    /// When the state was last rewritten
    pub last_updated: DateTime<Utc>,
}

/// The durable aggregate persisted between runs.
///
/// Written only after a poll cycle has fully completed its bookkeeping
/// (plus the final save during shutdown); the on-disk document never
/// reflects a partial cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestState {
    /// Schema version
    pub version: u32,
    /// References of all processed datasets, sorted for stable output
    pub processed_refs: Vec<String>,
    /// Running counters
    pub statistics: Statistics,
    /// Document timestamps
    pub metadata: StateTimestamps,
}

impl IngestState {
    /// A fresh, empty state created now.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            version: STATE_VERSION,
            processed_refs: Vec::new(),
            statistics: Statistics::default(),
            metadata: StateTimestamps {
                created_at: now,
                last_updated: now,
            },
        }
    }

    /// Build a state snapshot from the live tracker set and counters.
    pub fn snapshot(
        processed: HashSet<String>,
        statistics: Statistics,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut processed_refs: Vec<String> = processed.into_iter().collect();
        processed_refs.sort();
        Self {
            version: STATE_VERSION,
            processed_refs,
            statistics,
            metadata: StateTimestamps {
                created_at,
                last_updated: Utc::now(),
            },
        }
    }

    /// Processed references as a set, for restoring the tracker.
    pub fn processed_set(&self) -> HashSet<String> {
        self.processed_refs.iter().cloned().collect()
    }
}

/// Persists and reloads [`IngestState`].
#[derive(Debug)]
pub struct StateManager {
    state_dir: PathBuf,
    state_path: PathBuf,
    backup_path: PathBuf,
}

impl StateManager {
    /// Create a state manager, ensuring the state directory exists.
    ///
    /// # Errors
    ///
    /// An unusable state directory is fatal at bootstrap.
    pub fn new(state_dir: impl Into<PathBuf>) -> Result<Self, StateError> {
        let state_dir = state_dir.into();
        std::fs::create_dir_all(&state_dir).map_err(|e| StateError::Io {
            path: state_dir.clone(),
            source: e,
        })?;
        let state_path = state_dir.join(STATE_FILE);
        let backup_path = state_dir.join(BACKUP_FILE);
        Ok(Self {
            state_dir,
            state_path,
            backup_path,
        })
    }

    /// Path of the canonical state file.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Path of the backup state file.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Persist the state crash-safely.
    ///
    /// Steps, in order:
    /// 1. serialize into a staging file in the state directory;
    /// 2. copy the current canonical file (if any) over the backup;
    /// 3. atomically rename the staging file over the canonical path.
    ///
    /// An interruption between any two steps leaves a valid previous
    /// generation loadable from either canonical or backup.
    pub fn save(&self, state: &IngestState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)?;

        let mut staging =
            tempfile::NamedTempFile::new_in(&self.state_dir).map_err(|e| StateError::Io {
                path: self.state_dir.clone(),
                source: e,
            })?;
        staging.write_all(json.as_bytes()).map_err(|e| StateError::Io {
            path: self.state_path.clone(),
            source: e,
        })?;
        staging.flush().map_err(|e| StateError::Io {
            path: self.state_path.clone(),
            source: e,
        })?;

        if self.state_path.exists() {
            std::fs::copy(&self.state_path, &self.backup_path).map_err(|e| StateError::Io {
                path: self.backup_path.clone(),
                source: e,
            })?;
        }

        staging.persist(&self.state_path).map_err(|e| StateError::Io {
            path: self.state_path.clone(),
            source: e.error,
        })?;

        debug!(
            path = %self.state_path.display(),
            processed = state.processed_refs.len(),
            "state saved"
        );
        Ok(())
    }

    /// Load the persisted state.
    ///
    /// Falls back to the backup on a missing or corrupt canonical file
    /// (restoring the backup as canonical), and to a fresh empty state when
    /// neither is readable. Never fails past this boundary: total state loss
    /// is recoverable because re-ingestion is idempotent.
    pub fn load(&self) -> IngestState {
        match self.load_file(&self.state_path) {
            Ok(state) => {
                info!(
                    processed = state.processed_refs.len(),
                    total_polls = state.statistics.total_polls,
                    "state loaded"
                );
                state
            }
            Err(e) => {
                if self.state_path.exists() {
                    warn!(error = %e, "canonical state file unreadable, trying backup");
                }
                match self.load_file(&self.backup_path) {
                    Ok(state) => {
                        info!(
                            processed = state.processed_refs.len(),
                            "state restored from backup"
                        );
                        if let Err(e) = std::fs::copy(&self.backup_path, &self.state_path) {
                            warn!(error = %e, "failed to restore backup as canonical");
                        }
                        state
                    }
                    Err(backup_err) => {
                        if self.state_path.exists() || self.backup_path.exists() {
                            warn!(error = %backup_err, "no readable state, starting fresh");
                        } else {
                            info!("no previous state found, starting fresh");
                        }
                        IngestState::empty()
                    }
                }
            }
        }
    }

    fn load_file(&self, path: &Path) -> Result<IngestState, StateError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StateError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let state: IngestState = serde_json::from_str(&contents)?;
        if state.version != STATE_VERSION {
            return Err(StateError::VersionMismatch {
                expected: STATE_VERSION,
                found: state.version,
            });
        }
        Ok(state)
    }
}

/// State persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem operation failed
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path the operation touched
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// State document could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// State document has an unsupported schema version
    #[error("state version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Supported version
        expected: u32,
        /// Version found on disk
        found: u32,
    },
}
