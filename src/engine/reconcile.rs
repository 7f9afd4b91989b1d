//! Reconciliator
//!
//! Merges a user's stored tasks with the catalog. Produces the records to
//! create (catalog tasks the user has no copy of), the records to update
//! (copies behind the catalog version) and the merged, ordered task list.
//!
//! Nothing is written here and nothing is ever deleted: the caller hands the
//! create/update sets to the persistence layer.

use std::cmp::Ordering;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::domain::UserTask;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub to_create: Vec<UserTask>,
    pub to_update: Vec<UserTask>,
    pub result: Vec<UserTask>,
}

impl Reconciliation {
    /// No writes are needed
    pub fn is_settled(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }
}

/// Reconcile `stored` (the user's tasks) against `catalog`.
///
/// `next_key` is called once per task to create and must return a fresh
/// storage key.
pub fn reconcile<F>(catalog: &Catalog, stored: &[UserTask], author_id: &str, mut next_key: F) -> Reconciliation
where
    F: FnMut() -> String,
{
    let version = catalog.version();

    let to_create: Vec<UserTask> = catalog
        .tasks()
        .iter()
        .filter(|def| !stored.iter().any(|t| !t.custom && t.same_task(&def.label, def.frequency)))
        .map(|def| UserTask::from_definition(def, next_key(), author_id, version))
        .collect();

    let mut to_update = Vec::new();
    let existing: Vec<UserTask> = stored
        .iter()
        .map(|task| {
            if task.custom || task.version >= version {
                return task.clone();
            }
            let upgraded = match catalog.find(&task.label, task.frequency) {
                Some(def) => UserTask::upgraded_from(def, task, version),
                None => task.frozen(version),
            };
            to_update.push(upgraded.clone());
            upgraded
        })
        .collect();

    let mut result: Vec<UserTask> = to_create.iter().cloned().chain(existing).collect();
    result.sort_by(display_order);

    Reconciliation {
        to_create,
        to_update,
        result,
    }
}

/// Catalog tasks by catalog index, then custom tasks by their remembered
/// index (0 when they never had one). The sort is stable.
fn display_order(a: &UserTask, b: &UserTask) -> Ordering {
    a.custom
        .cmp(&b.custom)
        .then_with(|| a.index.unwrap_or(0).cmp(&b.index.unwrap_or(0)))
}
