use chrono::TimeDelta;

use super::Timestamp;

/// Result of offset derivation: the anchor it was measured from, the
/// invocation time normalised into the anchor's zone, and their difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebaseOffset {
    pub anchor: Timestamp,
    pub now: Timestamp,
    pub delta: TimeDelta,
}
