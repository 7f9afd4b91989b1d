//! Reset Boundaries
//!
//! Snapshot of the clock taken once per evaluation pass so every task is
//! judged against the same instants.

use serde::{Deserialize, Serialize};

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Epoch-millisecond instants marking the start of the current periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetBoundaries {
    pub daily_reset: i64,
    pub weekly_reset: i64,
    /// Instant the snapshot was taken
    pub now: i64,
}
