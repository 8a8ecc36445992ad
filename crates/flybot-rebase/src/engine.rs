//! `RebaseEngine` — the Restore → Load → ComputeOffset → ApplyOffset → Commit
//! pipeline behind the `Rebase` entry point.

use std::path::{Path, PathBuf};

use chrono::{SubsecRound, Utc};
use flybot_core::config::RebaseConfig;
use flybot_core::{FlybotResult, RebaseOffset, Timestamp};
use flybot_snapshot::SnapshotStore;
use tracing::{debug, info};

use crate::catalog::TableCatalog;
use crate::rebaser;

/// Outcome of one rebase invocation.
#[derive(Debug, Clone)]
pub struct RebaseReport {
    pub path: PathBuf,
    pub offset: RebaseOffset,
    pub shifted_cells: usize,
    pub tables: usize,
}

/// Rebases the working snapshot onto the current time.
///
/// Holds configuration only. Every run opens and closes its own connections;
/// callers must keep other readers and writers off the working copy while a
/// run is in progress.
pub struct RebaseEngine {
    config: RebaseConfig,
}

impl RebaseEngine {
    pub fn new(config: RebaseConfig) -> FlybotResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Reset `working` from `backup` and rebase it onto the wall clock.
    /// Returns the path of the rebased snapshot.
    pub fn rebase(&self, working: &Path, backup: &Path) -> FlybotResult<PathBuf> {
        let now = Utc::now().trunc_subsecs(0);
        self.rebase_at(working, backup, Timestamp::from(now))
            .map(|report| report.path)
    }

    /// [`rebase`](Self::rebase) with an explicit invocation time.
    pub fn rebase_at(
        &self,
        working: &Path,
        backup: &Path,
        now: Timestamp,
    ) -> FlybotResult<RebaseReport> {
        SnapshotStore::restore(working, backup)?;
        self.rebase_in_place(working, now)
    }

    /// Rebase `working` as it currently is, without restoring it first.
    ///
    /// Running this twice accumulates offsets: the second run measures its
    /// anchor from the already shifted copy.
    pub fn rebase_in_place(&self, working: &Path, now: Timestamp) -> FlybotResult<RebaseReport> {
        let mut tables = TableCatalog::load_all(working)?;

        // Anchor is read before any dependent (possibly itself) moves.
        let offset = rebaser::compute_offset(&tables, &self.config.anchor, now)?;
        debug!(
            anchor_column = %self.config.anchor,
            shifts_anchor = self.config.shifts_anchor(),
            "anchor measured"
        );
        let shifted_cells =
            rebaser::apply_offset(&mut tables, offset.delta, &self.config.dependents)?;

        TableCatalog::commit_all(working, &tables)?;

        info!(
            path = %working.display(),
            anchor = %offset.anchor,
            now = %offset.now,
            offset_secs = offset.delta.num_seconds(),
            shifted_cells,
            "snapshot rebased"
        );
        Ok(RebaseReport {
            path: working.to_path_buf(),
            offset,
            shifted_cells,
            tables: tables.len(),
        })
    }
}
