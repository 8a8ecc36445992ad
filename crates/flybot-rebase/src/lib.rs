//! # flybot-rebase
//!
//! Makes the frozen travel snapshot look current.
//! `catalog` materializes every table in memory and commits them back in one
//! transaction; `rebaser` derives a single offset from the anchor column and
//! shifts every dependent timestamp by it; `engine` runs the whole
//! Restore → Load → ComputeOffset → ApplyOffset → Commit pipeline.

pub mod catalog;
pub mod engine;
pub mod rebaser;

pub use catalog::{Table, TableCatalog, TableSet};
pub use engine::{RebaseEngine, RebaseReport};
