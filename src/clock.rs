//! Clock collaborator
//!
//! Supplies the current instant and the start of the current daily and
//! weekly tracking periods.

use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::config::ResetConfig;
use crate::domain::{ResetBoundaries, DAY_MS, HOUR_MS};

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    /// Reset boundaries for the instant `now`
    fn boundaries_at(&self, now: i64) -> ResetBoundaries;

    fn boundaries(&self) -> ResetBoundaries {
        self.boundaries_at(self.now_millis())
    }

    fn daily_reset(&self) -> i64 {
        self.boundaries().daily_reset
    }

    fn weekly_reset(&self) -> i64 {
        self.boundaries().weekly_reset
    }
}

/// Wall clock with a fixed daily reset hour and weekly reset weekday
#[derive(Debug, Clone)]
pub struct ServerClock {
    hour_utc: u32,
    weekly_day: Weekday,
    pinned: Option<i64>,
}

impl ServerClock {
    pub fn new(config: &ResetConfig) -> Self {
        Self {
            hour_utc: config.hour_utc,
            weekly_day: config.weekly_day,
            pinned: None,
        }
    }

    /// Freeze "now" at `millis`
    pub fn pinned_at(mut self, millis: i64) -> Self {
        self.pinned = Some(millis);
        self
    }

    fn daily_reset_at(&self, now: i64) -> i64 {
        let candidate = now.div_euclid(DAY_MS) * DAY_MS + i64::from(self.hour_utc) * HOUR_MS;
        if candidate > now {
            candidate - DAY_MS
        } else {
            candidate
        }
    }

    fn weekly_reset_at(&self, daily_reset: i64) -> i64 {
        let days_back = DateTime::<Utc>::from_timestamp_millis(daily_reset)
            .map(|d| {
                let today = i64::from(d.weekday().num_days_from_monday());
                let reset_day = i64::from(self.weekly_day.num_days_from_monday());
                (today - reset_day).rem_euclid(7)
            })
            .unwrap_or(0);
        daily_reset - days_back * DAY_MS
    }
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new(&ResetConfig::default())
    }
}

impl Clock for ServerClock {
    fn now_millis(&self) -> i64 {
        self.pinned.unwrap_or_else(|| Utc::now().timestamp_millis())
    }

    fn boundaries_at(&self, now: i64) -> ResetBoundaries {
        let daily_reset = self.daily_reset_at(now);
        ResetBoundaries {
            daily_reset,
            weekly_reset: self.weekly_reset_at(daily_reset),
            now,
        }
    }
}

/// Fixed boundaries, for tests
#[derive(Debug, Clone, Copy)]
pub struct StaticClock(pub ResetBoundaries);

impl Clock for StaticClock {
    fn now_millis(&self) -> i64 {
        self.0.now
    }

    fn boundaries_at(&self, now: i64) -> ResetBoundaries {
        ResetBoundaries { now, ..self.0 }
    }
}
