//! Completion Evaluator
//!
//! Decides how far one character got on one task in the current period.
//! Pure: the same inputs always give the same status, and nothing is
//! mutated. It runs once per character x task x friend when building the
//! planner, so it must stay cheap.

use chrono::{DateTime, Datelike, Utc};
use serde::{Serialize, Serializer};

use crate::domain::{Character, CompletionBook, LazyTracking, ResetBoundaries, TaskFrequency, TaskScope, UserTask, DAY_MS, HOUR_MS};

/// Offset between UTC midnight and the game's daily rollover
pub const SERVER_DAY_OFFSET_HOURS: i64 = 10;

/// Grace window granted to lazy characters on daily tasks
pub const LAZY_GRACE_DAYS: i64 = 2;

/// Outcome of evaluating a task for a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task does not run on the current server day
    Excluded,
    /// Units done in the current period, capped at the task amount
    Progress(u32),
}

impl TaskStatus {
    pub fn is_excluded(self) -> bool {
        matches!(self, TaskStatus::Excluded)
    }

    pub fn progress(self) -> Option<u32> {
        match self {
            TaskStatus::Excluded => None,
            TaskStatus::Progress(amount) => Some(amount),
        }
    }

    pub fn is_complete(self, required: u32) -> bool {
        matches!(self, TaskStatus::Progress(done) if done >= required)
    }

    /// Units still missing, `None` when excluded
    pub fn remaining(self, required: u32) -> Option<u32> {
        self.progress().map(|done| required.saturating_sub(done))
    }

    /// Wire form: -1 for excluded, the amount otherwise
    pub fn as_raw(self) -> i64 {
        match self {
            TaskStatus::Excluded => -1,
            TaskStatus::Progress(amount) => i64::from(amount),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

/// Weekday index (Sunday = 0) of the server day containing `now`
pub fn server_weekday(now: i64) -> Option<u8> {
    let shifted = now - SERVER_DAY_OFFSET_HOURS * HOUR_MS;
    DateTime::<Utc>::from_timestamp_millis(shifted).map(|d| d.weekday().num_days_from_sunday() as u8)
}

pub fn evaluate(
    task: &UserTask,
    character: &Character,
    completion: &CompletionBook,
    resets: &ResetBoundaries,
    lazy_tracking: &LazyTracking,
) -> TaskStatus {
    let mut daily_reset = resets.daily_reset;
    if character.lazy && task.scope != TaskScope::Roster {
        let flag = lazy_tracking.get(&character.name, &task.key);
        if flag.unwrap_or(true) {
            daily_reset -= LAZY_GRACE_DAYS * DAY_MS;
        }
    }

    if !task.days_filter.is_empty() {
        let runs_today = server_weekday(resets.now)
            .map(|day| task.days_filter.contains(&day))
            .unwrap_or(true);
        if !runs_today {
            return TaskStatus::Excluded;
        }
    }

    let record = match completion.entry(&character.name, &task.key) {
        Some(record) => record,
        None => return TaskStatus::Progress(0),
    };

    let reset = match task.frequency {
        TaskFrequency::Daily => daily_reset,
        TaskFrequency::Weekly => resets.weekly_reset,
    };

    if record.updated < reset {
        TaskStatus::Progress(0)
    } else {
        TaskStatus::Progress(record.amount.min(task.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::domain::CompletionRecord;

    fn millis(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis()
    }

    fn task(frequency: TaskFrequency, scope: TaskScope) -> UserTask {
        let mut task = UserTask::new_custom("alice", "Chaos Dungeon".to_string(), frequency, scope, 2);
        task.key = "t1".to_string();
        task
    }

    // Wednesday 2024-03-13 12:00 UTC, daily reset that morning
    fn resets() -> ResetBoundaries {
        ResetBoundaries {
            daily_reset: millis(2024, 3, 13, 10),
            weekly_reset: millis(2024, 3, 7, 10),
            now: millis(2024, 3, 13, 12),
        }
    }

    fn book_with(amount: u32, updated: i64) -> CompletionBook {
        let mut book = CompletionBook::new("alice");
        book.record("Bard", "t1", CompletionRecord { amount, updated });
        book
    }

    #[test]
    fn test_missing_record_is_zero() {
        let status = evaluate(&task(TaskFrequency::Daily, TaskScope::Character), &Character::new("Bard", 1370), &CompletionBook::new("alice"), &resets(), &LazyTracking::new());
        assert_eq!(status, TaskStatus::Progress(0));
    }

    #[test]
    fn test_fresh_and_stale_records() {
        let r = resets();
        let bard = Character::new("Bard", 1370);
        let daily = task(TaskFrequency::Daily, TaskScope::Character);

        let fresh = book_with(1, r.daily_reset + 1);
        assert_eq!(evaluate(&daily, &bard, &fresh, &r, &LazyTracking::new()), TaskStatus::Progress(1));

        let stale = book_with(2, r.daily_reset - 1);
        assert_eq!(evaluate(&daily, &bard, &stale, &r, &LazyTracking::new()), TaskStatus::Progress(0));
    }

    #[test]
    fn test_weekly_uses_weekly_reset() {
        let r = resets();
        let bard = Character::new("Bard", 1370);
        let weekly = task(TaskFrequency::Weekly, TaskScope::Character);

        // Done yesterday: stale for dailies, still counts for weeklies
        let book = book_with(2, r.daily_reset - DAY_MS);
        assert_eq!(evaluate(&weekly, &bard, &book, &r, &LazyTracking::new()), TaskStatus::Progress(2));
    }

    #[test]
    fn test_lazy_character_gets_grace_window() {
        let r = resets();
        let mut bard = Character::new("Bard", 1370);
        bard.lazy = true;
        let daily = task(TaskFrequency::Daily, TaskScope::Character);
        let book = book_with(1, r.daily_reset - DAY_MS);

        assert_eq!(evaluate(&daily, &bard, &book, &r, &LazyTracking::new()), TaskStatus::Progress(1));

        let mut opted_out = LazyTracking::new();
        opted_out.set("Bard", "t1", false);
        assert_eq!(evaluate(&daily, &bard, &book, &r, &opted_out), TaskStatus::Progress(0));

        let mut opted_in = LazyTracking::new();
        opted_in.set("Bard", "t1", true);
        assert_eq!(evaluate(&daily, &bard, &book, &r, &opted_in), TaskStatus::Progress(1));
    }

    #[test]
    fn test_grace_window_is_exactly_two_days() {
        let r = resets();
        let mut bard = Character::new("Bard", 1370);
        bard.lazy = true;
        let daily = task(TaskFrequency::Daily, TaskScope::Character);

        let edge = book_with(1, r.daily_reset - 2 * DAY_MS);
        assert_eq!(evaluate(&daily, &bard, &edge, &r, &LazyTracking::new()), TaskStatus::Progress(1));

        let beyond = book_with(1, r.daily_reset - 2 * DAY_MS - 1);
        assert_eq!(evaluate(&daily, &bard, &beyond, &r, &LazyTracking::new()), TaskStatus::Progress(0));
    }

    #[test]
    fn test_roster_tasks_ignore_lazy() {
        let r = resets();
        let mut bard = Character::new("Bard", 1370);
        bard.lazy = true;
        let roster_task = task(TaskFrequency::Daily, TaskScope::Roster);
        let book = book_with(1, r.daily_reset - DAY_MS);

        assert_eq!(evaluate(&roster_task, &bard, &book, &r, &LazyTracking::new()), TaskStatus::Progress(0));
    }

    #[test]
    fn test_days_filter_excludes() {
        // Tuesday 2024-03-12 15:00 UTC
        let r = ResetBoundaries {
            daily_reset: millis(2024, 3, 12, 10),
            weekly_reset: millis(2024, 3, 7, 10),
            now: millis(2024, 3, 12, 15),
        };
        let mut mwf = task(TaskFrequency::Daily, TaskScope::Roster);
        mwf.days_filter = vec![1, 3, 5];
        let book = book_with(1, r.daily_reset + 1);

        assert_eq!(evaluate(&mwf, &Character::new("Bard", 1370), &book, &r, &LazyTracking::new()), TaskStatus::Excluded);
    }

    #[test]
    fn test_server_day_starts_at_ten_utc() {
        // Wednesday 09:00 UTC still belongs to Tuesday's server day
        assert_eq!(server_weekday(millis(2024, 3, 13, 9)), Some(2));
        assert_eq!(server_weekday(millis(2024, 3, 13, 10)), Some(3));
    }

    #[test]
    fn test_progress_is_capped() {
        let r = resets();
        let book = book_with(5, r.daily_reset + 1);
        let status = evaluate(&task(TaskFrequency::Daily, TaskScope::Character), &Character::new("Bard", 1370), &book, &r, &LazyTracking::new());
        assert_eq!(status, TaskStatus::Progress(2));
        assert!(status.is_complete(2));
        assert_eq!(status.remaining(2), Some(0));
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let r = resets();
        let t = task(TaskFrequency::Daily, TaskScope::Character);
        let bard = Character::new("Bard", 1370);
        let book = book_with(1, r.daily_reset + 5);
        let lazy = LazyTracking::new();

        let first = evaluate(&t, &bard, &book, &r, &lazy);
        let second = evaluate(&t, &bard, &book, &r, &lazy);
        assert_eq!(first, second);
        assert_eq!(book, book_with(1, r.daily_reset + 5));
    }

    #[test]
    fn test_raw_values() {
        assert_eq!(TaskStatus::Excluded.as_raw(), -1);
        assert_eq!(TaskStatus::Progress(3).as_raw(), 3);
        assert_eq!(TaskStatus::Excluded.remaining(2), None);
    }
}
