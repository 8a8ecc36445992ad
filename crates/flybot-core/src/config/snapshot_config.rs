//! Snapshot acquisition configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Where the snapshot comes from and where its two on-disk copies live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub source_url: String,
    /// Working copy: the file rebase rewrites and the tools query.
    pub db_path: PathBuf,
    /// Pristine copy as downloaded. Never touched by rebase.
    pub backup_path: PathBuf,
    /// Download deadline. 0 = none.
    pub fetch_timeout_secs: u64,
    /// Run `PRAGMA quick_check` on the downloaded payload before keeping it.
    pub verify_after_fetch: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            source_url: constants::DEFAULT_SNAPSHOT_URL.to_string(),
            db_path: PathBuf::from(constants::DEFAULT_DB_PATH),
            backup_path: PathBuf::from(constants::DEFAULT_BACKUP_PATH),
            fetch_timeout_secs: constants::DEFAULT_FETCH_TIMEOUT_SECS,
            verify_after_fetch: true,
        }
    }
}

impl SnapshotConfig {
    /// Returns the effective fetch timeout, `None` when disabled.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self.fetch_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
