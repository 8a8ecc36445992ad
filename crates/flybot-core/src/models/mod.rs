pub mod column_ref;
pub mod rebase_offset;
pub mod timestamp;

pub use column_ref::ColumnRef;
pub use rebase_offset::RebaseOffset;
pub use timestamp::{Timestamp, TimestampLayout, ZoneStyle};
