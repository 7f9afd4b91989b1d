//! Subtask Bracket Resolver
//!
//! Splits a parent task into item level tiers. Each subtask opens a bracket
//! at its `min_ilvl` that closes one level below the next subtask; the last
//! bracket stays open up to `MAX_ILVL`.

use serde::Serialize;

use crate::domain::{Subtask, UserTask, MAX_ILVL};

/// Inclusive item level range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bracket {
    pub min_ilvl: u32,
    pub max_ilvl: u32,
}

/// A task as shown in tier-aware views: either the parent itself or one of
/// its brackets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    /// Parent task with the bracket's item level range applied
    pub task: UserTask,
    /// Subtask name, or the parent label when there are no subtasks
    pub name: String,
    pub banner: Option<String>,
}

/// Brackets for subtasks already sorted by ascending `min_ilvl`
pub fn resolve_brackets(subtasks: &[&Subtask]) -> Vec<Bracket> {
    subtasks
        .iter()
        .enumerate()
        .map(|(i, st)| Bracket {
            min_ilvl: st.min_ilvl,
            max_ilvl: subtasks
                .get(i + 1)
                .map(|next| next.min_ilvl.saturating_sub(1))
                .unwrap_or(MAX_ILVL),
        })
        .collect()
}

/// Expand `task` into one `PlannerTask` per matching subtask
pub fn expand_task(task: &UserTask, subtasks: &[Subtask]) -> Vec<PlannerTask> {
    let mut children: Vec<&Subtask> = subtasks
        .iter()
        .filter(|st| st.parent_name == task.label)
        .collect();

    if children.is_empty() {
        return vec![PlannerTask {
            task: task.clone(),
            name: task.label.clone(),
            banner: None,
        }];
    }

    children.sort_by_key(|st| st.min_ilvl);
    let brackets = resolve_brackets(&children);

    children
        .into_iter()
        .zip(brackets)
        .map(|(child, bracket)| {
            let mut derived = task.clone();
            derived.min_ilvl = bracket.min_ilvl;
            derived.max_ilvl = bracket.max_ilvl;
            PlannerTask {
                task: derived,
                name: child.name.clone(),
                banner: child.banner.clone(),
            }
        })
        .collect()
}

/// Expand every task of a list, keeping list order
pub fn expand_all(tasks: &[UserTask], subtasks: &[Subtask]) -> Vec<PlannerTask> {
    tasks
        .iter()
        .flat_map(|task| expand_task(task, subtasks))
        .collect()
}
