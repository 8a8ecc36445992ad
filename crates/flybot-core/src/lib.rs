//! # flybot-core
//!
//! Foundation crate for the Flybot travel snapshot.
//! Defines the error taxonomy, configuration, timestamp model, constants
//! and tracing setup shared by `flybot-snapshot` and `flybot-rebase`.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod observability;

pub use config::FlybotConfig;
pub use errors::{ErrorKind, FlybotError, FlybotResult};
pub use models::{ColumnRef, RebaseOffset, Timestamp, TimestampLayout};
