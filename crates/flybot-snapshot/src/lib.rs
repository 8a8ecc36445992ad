//! # flybot-snapshot
//!
//! Owns the acquire / backup / restore lifecycle of the travel snapshot.
//! The backup is the pristine copy as downloaded; the working copy is
//! re-derived from it before every rebase so shifts never compound.

pub mod files;
pub mod source;
pub mod store;

pub use source::{HttpSnapshotSource, ISnapshotSource};
pub use store::{AcquireOutcome, SnapshotStore};
