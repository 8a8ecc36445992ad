pub mod rebase_config;
pub mod snapshot_config;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{FlybotError, FlybotResult};

pub use rebase_config::RebaseConfig;
pub use snapshot_config::SnapshotConfig;

/// Top-level configuration aggregating the snapshot and rebase sections.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlybotConfig {
    pub snapshot: SnapshotConfig,
    pub rebase: RebaseConfig,
}

impl FlybotConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> FlybotResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.rebase.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file on disk.
    pub fn from_file(path: &Path) -> FlybotResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| FlybotError::io(path, e))?;
        let config = Self::from_toml(&raw)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}
