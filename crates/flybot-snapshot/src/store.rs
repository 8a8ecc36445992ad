//! `SnapshotStore` — acquire the pristine snapshot, restore working copies.

use std::path::Path;

use flybot_core::config::SnapshotConfig;
use flybot_core::{FlybotError, FlybotResult};
use tracing::{info, warn};

use crate::files;
use crate::source::{HttpSnapshotSource, ISnapshotSource};

/// What `acquire` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Target already present and overwrite not requested. No network access.
    Skipped,
    Downloaded { bytes: u64 },
}

/// Manages the backup copy and the working copy derived from it.
///
/// Holds no open handles between calls; every operation opens and
/// releases its own files.
pub struct SnapshotStore {
    source: Box<dyn ISnapshotSource>,
    verify_after_fetch: bool,
}

impl SnapshotStore {
    /// Store backed by an HTTP download of `config.source_url`.
    pub fn new(config: &SnapshotConfig) -> FlybotResult<Self> {
        let source = HttpSnapshotSource::new(&config.source_url, config.fetch_timeout())?;
        Ok(Self::with_source(Box::new(source), config.verify_after_fetch))
    }

    /// Store backed by an arbitrary source.
    pub fn with_source(source: Box<dyn ISnapshotSource>, verify_after_fetch: bool) -> Self {
        Self {
            source,
            verify_after_fetch,
        }
    }

    /// Download the snapshot to `target` and copy it to `backup`.
    ///
    /// No-op when `target` exists and `overwrite` is false. A failed download
    /// leaves any previous `target` in place.
    pub fn acquire(
        &self,
        target: &Path,
        backup: &Path,
        overwrite: bool,
    ) -> FlybotResult<AcquireOutcome> {
        if !overwrite && target.exists() {
            info!(path = %target.display(), "snapshot present, skipping download");
            return Ok(AcquireOutcome::Skipped);
        }

        info!(url = self.source.location(), path = %target.display(), "downloading snapshot");
        let verify = self.verify_after_fetch;
        let bytes = files::write_atomically(target, |tmp| {
            let bytes = self.source.fetch_into(tmp)?;
            if verify {
                files::verify_sqlite(tmp.path()).map_err(|detail| FlybotError::Fetch {
                    url: self.source.location().to_string(),
                    message: format!("payload is not a healthy SQLite database: {detail}"),
                })?;
            }
            Ok(bytes)
        })?;

        files::copy_atomically(target, backup)?;
        info!(
            path = %target.display(),
            backup = %backup.display(),
            bytes,
            "snapshot downloaded and backed up"
        );
        Ok(AcquireOutcome::Downloaded { bytes })
    }

    /// Replace `working` with a fresh copy of `backup`.
    ///
    /// Fails with an IO error when `backup` does not exist. The backup is
    /// only read.
    pub fn restore(working: &Path, backup: &Path) -> FlybotResult<()> {
        if !backup.is_file() {
            warn!(backup = %backup.display(), "backup snapshot missing");
            return Err(FlybotError::io(
                backup,
                std::io::Error::new(std::io::ErrorKind::NotFound, "backup snapshot not found"),
            ));
        }

        files::remove_sidecars(working)?;
        let bytes = files::copy_atomically(backup, working)?;
        info!(
            working = %working.display(),
            backup = %backup.display(),
            bytes,
            "working copy restored from backup"
        );
        Ok(())
    }
}
