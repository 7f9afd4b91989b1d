//! Sharing Matcher
//!
//! For every shared task a user still has to do, finds the friends whose
//! characters can still run it too, and how many units each of them can
//! actually contribute.

use serde::Serialize;

use crate::domain::{Character, CompletionBook, LazyTracking, ResetBoundaries, Roster, Subtask, TaskFrequency, TaskScope, UserTask};
use super::brackets::{expand_all, PlannerTask};
use super::evaluate::{evaluate, TaskStatus};

/// Everything known about one friend
#[derive(Debug, Clone, Default)]
pub struct FriendData {
    pub friend_id: String,
    pub roster: Roster,
    pub completion: CompletionBook,
    pub lazy_tracking: LazyTracking,
    /// The friend's stored tasks
    pub tasks: Vec<UserTask>,
}

/// The caller's side of the match
#[derive(Debug, Clone, Copy)]
pub struct SharingInput<'a> {
    pub tasks: &'a [PlannerTask],
    pub roster: &'a Roster,
    pub completion: &'a CompletionBook,
    pub resets: &'a ResetBoundaries,
    pub lazy_tracking: &'a LazyTracking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendCharacter {
    pub name: String,
    pub ilvl: u32,
    /// Units this character can run together with the caller's character
    pub doable: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendHelp {
    pub friend_id: String,
    pub characters: Vec<FriendCharacter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRow {
    pub character: String,
    pub done: TaskStatus,
    pub can_do: bool,
    pub friends: Vec<FriendHelp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub task: PlannerTask,
    pub characters: Vec<CharacterRow>,
}

/// Rows grouped by frequency x scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingBoard {
    pub daily_character: Vec<TaskRow>,
    pub weekly_character: Vec<TaskRow>,
    pub daily_roster: Vec<TaskRow>,
    pub weekly_roster: Vec<TaskRow>,
}

impl SharingBoard {
    fn bucket_mut(&mut self, frequency: TaskFrequency, scope: TaskScope) -> &mut Vec<TaskRow> {
        match (frequency, scope) {
            (TaskFrequency::Daily, TaskScope::Character) => &mut self.daily_character,
            (TaskFrequency::Weekly, TaskScope::Character) => &mut self.weekly_character,
            (TaskFrequency::Daily, TaskScope::Roster) => &mut self.daily_roster,
            (TaskFrequency::Weekly, TaskScope::Roster) => &mut self.weekly_roster,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &TaskRow> {
        self.daily_character
            .iter()
            .chain(&self.weekly_character)
            .chain(&self.daily_roster)
            .chain(&self.weekly_roster)
    }

    pub fn is_empty(&self) -> bool {
        self.rows().next().is_none()
    }
}

/// Tasks worth showing in the planner: bracket-expanded, enabled, shared,
/// cataloged, and reachable by at least one roster character
pub fn shareable_tasks(tasks: &[UserTask], subtasks: &[Subtask], roster: &Roster) -> Vec<PlannerTask> {
    expand_all(tasks, subtasks)
        .into_iter()
        .filter(|p| {
            p.task.enabled
                && p.task.shared
                && !p.task.custom
                && roster.characters.iter().any(|c| p.task.accepts_ilvl(c.ilvl))
        })
        .collect()
}

/// The friend's copy of `task`, if they track the same cataloged task
fn friend_task<'a>(task: &UserTask, friend_tasks: &'a [UserTask]) -> Option<&'a UserTask> {
    friend_tasks.iter().find(|ft| {
        !ft.custom
            && ft.label == task.label
            && ft.frequency == task.frequency
            && ft.scope == task.scope
            && ft.icon_path == task.icon_path
    })
}

fn friend_help(task: &UserTask, caller_done: u32, friend: &FriendData, resets: &ResetBoundaries) -> Option<FriendHelp> {
    let their_task = friend_task(task, &friend.tasks)?;
    let caller_remaining = task.amount.saturating_sub(caller_done);

    let characters: Vec<FriendCharacter> = friend
        .roster
        .characters
        .iter()
        .filter(|c| !c.is_private && task.accepts_ilvl(c.ilvl))
        .filter_map(|c| {
            let done = evaluate(their_task, c, &friend.completion, resets, &friend.lazy_tracking).progress()?;
            if done >= task.amount {
                return None;
            }
            Some(FriendCharacter {
                name: c.name.clone(),
                ilvl: c.ilvl,
                doable: (task.amount - done).min(caller_remaining),
            })
        })
        .collect();

    if characters.is_empty() {
        None
    } else {
        Some(FriendHelp {
            friend_id: friend.friend_id.clone(),
            characters,
        })
    }
}

fn character_row(task: &UserTask, character: &Character, input: &SharingInput<'_>, friends: &[FriendData]) -> CharacterRow {
    let done = evaluate(task, character, input.completion, input.resets, input.lazy_tracking);
    let can_do = task.accepts_ilvl(character.ilvl);

    let friends = match done {
        TaskStatus::Progress(amount) if can_do && amount < task.amount => friends
            .iter()
            .filter_map(|friend| friend_help(task, amount, friend, input.resets))
            .collect(),
        _ => Vec::new(),
    };

    CharacterRow {
        character: character.name.clone(),
        done,
        can_do,
        friends,
    }
}

/// Build the planner board for `input` against every friend in `friends`
pub fn match_shared_tasks(input: &SharingInput<'_>, friends: &[FriendData]) -> SharingBoard {
    let mut board = SharingBoard::default();
    for planner_task in input.tasks {
        let task = &planner_task.task;
        let row = TaskRow {
            task: planner_task.clone(),
            characters: input
                .roster
                .characters
                .iter()
                .map(|c| character_row(task, c, input, friends))
                .collect(),
        };
        board.bucket_mut(task.frequency, task.scope).push(row);
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::domain::{CompletionRecord, MAX_ILVL};
    use crate::engine::brackets::expand_task;

    fn millis(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis()
    }

    fn resets() -> ResetBoundaries {
        ResetBoundaries {
            daily_reset: millis(2024, 3, 13, 10),
            weekly_reset: millis(2024, 3, 7, 10),
            now: millis(2024, 3, 13, 12),
        }
    }

    fn shared_task(owner: &str, key: &str, label: &str, frequency: TaskFrequency, scope: TaskScope, amount: u32) -> UserTask {
        let mut task = UserTask::new_custom(owner, label.to_string(), frequency, scope, amount);
        task.key = key.to_string();
        task.custom = false;
        task.shared = true;
        task.icon_path = Some(format!("{}.png", label));
        task
    }

    fn planner(task: UserTask) -> PlannerTask {
        PlannerTask {
            name: task.label.clone(),
            task,
            banner: None,
        }
    }

    fn friend(id: &str, characters: Vec<Character>, tasks: Vec<UserTask>) -> FriendData {
        FriendData {
            friend_id: id.to_string(),
            roster: Roster::new(id, characters),
            completion: CompletionBook::new(id),
            lazy_tracking: LazyTracking::new(),
            tasks,
        }
    }

    #[test]
    fn test_doable_is_bounded_by_both_sides() {
        let r = resets();
        let mine = shared_task("alice", "a-guardian", "Guardian", TaskFrequency::Daily, TaskScope::Character, 3);
        let roster = Roster::new("alice", vec![Character::new("Bard", 1370)]);
        let mut completion = CompletionBook::new("alice");
        completion.record("Bard", "a-guardian", CompletionRecord { amount: 1, updated: r.daily_reset + 1 });

        let theirs = shared_task("bob", "b-guardian", "Guardian", TaskFrequency::Daily, TaskScope::Character, 3);
        let mut bob = friend("bob", vec![Character::new("Gunlancer", 1380)], vec![theirs]);
        bob.completion.record("Gunlancer", "b-guardian", CompletionRecord { amount: 2, updated: r.daily_reset + 1 });

        let tasks = vec![planner(mine)];
        let input = SharingInput {
            tasks: &tasks,
            roster: &roster,
            completion: &completion,
            resets: &r,
            lazy_tracking: &LazyTracking::new(),
        };
        let board = match_shared_tasks(&input, &[bob]);

        let row = &board.daily_character[0].characters[0];
        assert_eq!(row.done, TaskStatus::Progress(1));
        assert!(row.can_do);
        // Caller needs 2 more, friend needs 1 more
        assert_eq!(row.friends[0].characters[0].doable, 1);
    }

    #[test]
    fn test_finished_or_ineligible_characters_skip_friends() {
        let r = resets();
        let mine = shared_task("alice", "a1", "Argos", TaskFrequency::Weekly, TaskScope::Character, 1);
        let mut gated = mine.clone();
        gated.min_ilvl = 1370;
        let roster = Roster::new("alice", vec![Character::new("Done", 1400), Character::new("Low", 1300)]);
        let mut completion = CompletionBook::new("alice");
        completion.record("Done", "a1", CompletionRecord { amount: 1, updated: r.weekly_reset + 1 });

        let bob = friend("bob", vec![Character::new("Paladin", 1400)], vec![shared_task("bob", "b1", "Argos", TaskFrequency::Weekly, TaskScope::Character, 1)]);
        let tasks = vec![planner(gated)];
        let input = SharingInput {
            tasks: &tasks,
            roster: &roster,
            completion: &completion,
            resets: &r,
            lazy_tracking: &LazyTracking::new(),
        };
        let board = match_shared_tasks(&input, &[bob]);

        let rows = &board.weekly_character[0].characters;
        assert!(rows[0].friends.is_empty());
        assert_eq!(rows[0].done, TaskStatus::Progress(1));
        assert!(!rows[1].can_do);
        assert!(rows[1].friends.is_empty());
    }

    #[test]
    fn test_friend_task_must_match_exactly() {
        let r = resets();
        let mine = shared_task("alice", "a1", "Chaos Dungeon", TaskFrequency::Daily, TaskScope::Character, 2);
        let roster = Roster::new("alice", vec![Character::new("Bard", 1370)]);

        let mut custom_copy = shared_task("bob", "b1", "Chaos Dungeon", TaskFrequency::Daily, TaskScope::Character, 2);
        custom_copy.custom = true;
        let mut other_icon = shared_task("carol", "c1", "Chaos Dungeon", TaskFrequency::Daily, TaskScope::Character, 2);
        other_icon.icon_path = Some("elsewhere.png".to_string());
        let exact = shared_task("dave", "d1", "Chaos Dungeon", TaskFrequency::Daily, TaskScope::Character, 2);

        let friends = vec![
            friend("bob", vec![Character::new("B", 1370)], vec![custom_copy]),
            friend("carol", vec![Character::new("C", 1370)], vec![other_icon]),
            friend("dave", vec![Character::new("D", 1370)], vec![exact]),
            friend("erin", vec![Character::new("E", 1370)], Vec::new()),
        ];
        let tasks = vec![planner(mine)];
        let completion = CompletionBook::new("alice");
        let input = SharingInput {
            tasks: &tasks,
            roster: &roster,
            completion: &completion,
            resets: &r,
            lazy_tracking: &LazyTracking::new(),
        };
        let board = match_shared_tasks(&input, &friends);

        let helpers: Vec<_> = board.daily_character[0].characters[0].friends.iter().map(|f| f.friend_id.as_str()).collect();
        assert_eq!(helpers, vec!["dave"]);
    }

    #[test]
    fn test_private_done_and_out_of_range_friend_characters_dropped() {
        let r = resets();
        let mut mine = shared_task("alice", "a1", "Guardian", TaskFrequency::Daily, TaskScope::Character, 2);
        mine.min_ilvl = 1340;
        mine.max_ilvl = 1369;
        let roster = Roster::new("alice", vec![Character::new("Bard", 1350)]);

        let mut hidden = Character::new("Hidden", 1350);
        hidden.is_private = true;
        let mut bob = friend(
            "bob",
            vec![hidden, Character::new("Finished", 1350), Character::new("Outleveled", 1400), Character::new("Ready", 1345)],
            vec![shared_task("bob", "b1", "Guardian", TaskFrequency::Daily, TaskScope::Character, 2)],
        );
        bob.completion.record("Finished", "b1", CompletionRecord { amount: 2, updated: r.daily_reset + 1 });

        let tasks = vec![planner(mine)];
        let completion = CompletionBook::new("alice");
        let input = SharingInput {
            tasks: &tasks,
            roster: &roster,
            completion: &completion,
            resets: &r,
            lazy_tracking: &LazyTracking::new(),
        };
        let board = match_shared_tasks(&input, &[bob]);

        let help = &board.daily_character[0].characters[0].friends[0];
        let names: Vec<_> = help.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ready"]);
        assert_eq!(help.characters[0].doable, 2);
    }

    #[test]
    fn test_rows_are_bucketed() {
        let r = resets();
        let roster = Roster::new("alice", vec![Character::new("Bard", 1370)]);
        let tasks: Vec<PlannerTask> = [
            (TaskFrequency::Daily, TaskScope::Character),
            (TaskFrequency::Weekly, TaskScope::Character),
            (TaskFrequency::Daily, TaskScope::Roster),
            (TaskFrequency::Weekly, TaskScope::Roster),
            (TaskFrequency::Weekly, TaskScope::Roster),
        ]
        .iter()
        .enumerate()
        .map(|(i, (f, s))| planner(shared_task("alice", &format!("k{}", i), &format!("T{}", i), *f, *s, 1)))
        .collect();
        let completion = CompletionBook::new("alice");
        let input = SharingInput {
            tasks: &tasks,
            roster: &roster,
            completion: &completion,
            resets: &r,
            lazy_tracking: &LazyTracking::new(),
        };

        let board = match_shared_tasks(&input, &[]);
        assert_eq!(board.daily_character.len(), 1);
        assert_eq!(board.weekly_character.len(), 1);
        assert_eq!(board.daily_roster.len(), 1);
        assert_eq!(board.weekly_roster.len(), 2);
        assert_eq!(board.rows().count(), 5);
    }

    #[test]
    fn test_shareable_tasks_filter() {
        let mut guardian = shared_task("alice", "g", "Guardian", TaskFrequency::Daily, TaskScope::Character, 2);
        guardian.max_ilvl = MAX_ILVL;
        let mut disabled = shared_task("alice", "d", "Chaos Dungeon", TaskFrequency::Daily, TaskScope::Character, 2);
        disabled.enabled = false;
        let mut unshared = shared_task("alice", "u", "Una's Tasks", TaskFrequency::Daily, TaskScope::Character, 3);
        unshared.shared = false;
        let mut custom = shared_task("alice", "c", "Rapport", TaskFrequency::Daily, TaskScope::Roster, 6);
        custom.custom = true;

        let roster = Roster::new("alice", vec![Character::new("Bard", 1350)]);
        let subtasks = crate::catalog::builtin_subtasks();
        let shown = shareable_tasks(&[guardian.clone(), disabled, unshared, custom], &subtasks, &roster);

        // Only the guardian bracket containing 1350 survives
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].name, "Igrexion");
        assert_eq!(shown[0], expand_task(&guardian, &subtasks)[17]);
    }

    #[test]
    fn test_doable_never_exceeds_remaining_need() {
        let r = resets();
        let roster = Roster::new("alice", vec![Character::new("Bard", 1370)]);
        for caller_done in 0..4u32 {
            for friend_done in 0..4u32 {
                let mine = shared_task("alice", "a", "Guardian", TaskFrequency::Daily, TaskScope::Character, 3);
                let mut completion = CompletionBook::new("alice");
                completion.record("Bard", "a", CompletionRecord { amount: caller_done, updated: r.daily_reset + 1 });
                let mut bob = friend("bob", vec![Character::new("G", 1370)], vec![shared_task("bob", "b", "Guardian", TaskFrequency::Daily, TaskScope::Character, 3)]);
                bob.completion.record("G", "b", CompletionRecord { amount: friend_done, updated: r.daily_reset + 1 });

                let tasks = vec![planner(mine)];
                let input = SharingInput {
                    tasks: &tasks,
                    roster: &roster,
                    completion: &completion,
                    resets: &r,
                    lazy_tracking: &LazyTracking::new(),
                };
                let board = match_shared_tasks(&input, &[bob]);
                for help in &board.daily_character[0].characters[0].friends {
                    for c in &help.characters {
                        assert!(c.doable <= 3 - caller_done.min(3));
                        assert!(c.doable <= 3 - friend_done.min(3));
                        assert!(c.doable > 0);
                    }
                }
            }
        }
    }
}
