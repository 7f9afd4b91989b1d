//! Task Commands
//!
//! Authoring, editing and transfer of a user's tasks. Every write is
//! followed by a reconciliation pass so the feed reflects it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{
    CompletionPatch, DomainError, DomainResult, TaskFilter, TaskFrequency, TaskPatch, TaskScope, UserTask, MAX_ILVL,
};
use crate::engine::Reconciliation;
use crate::repository::{Repository, WriteBatch};
use crate::AppState;

/// Fields of a task the user authors by hand
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub label: String,
    pub frequency: TaskFrequency,
    pub scope: TaskScope,
    pub amount: u32,
    #[serde(default)]
    pub min_ilvl: u32,
    #[serde(default = "max_ilvl")]
    pub max_ilvl: u32,
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub days_filter: Vec<u8>,
}

/// Import/export record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub label: String,
    #[serde(default)]
    pub min_ilvl: u32,
    pub frequency: TaskFrequency,
    pub scope: TaskScope,
    #[serde(default = "amount")]
    pub amount: u32,
    #[serde(default = "max_ilvl")]
    pub max_ilvl: u32,
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Written on export; import makes every task custom regardless
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub days_filter: Vec<u8>,
}

fn max_ilvl() -> u32 {
    MAX_ILVL
}

fn amount() -> u32 {
    1
}

fn enabled() -> bool {
    true
}

impl From<&UserTask> for TaskRecord {
    fn from(task: &UserTask) -> Self {
        Self {
            label: task.label.clone(),
            min_ilvl: task.min_ilvl,
            frequency: task.frequency,
            scope: task.scope,
            amount: task.amount,
            max_ilvl: task.max_ilvl,
            icon_path: task.icon_path.clone(),
            enabled: task.enabled,
            custom: task.custom,
            days_filter: task.days_filter.clone(),
        }
    }
}

impl TaskRecord {
    /// Imported records always become custom tasks of `author_id`
    fn into_task(self, author_id: &str, key: String) -> UserTask {
        let mut task = UserTask::new_custom(author_id, self.label, self.frequency, self.scope, self.amount);
        task.key = key;
        task.min_ilvl = self.min_ilvl;
        task.max_ilvl = self.max_ilvl;
        task.icon_path = self.icon_path;
        task.enabled = self.enabled;
        task.days_filter = self.days_filter;
        task
    }
}

/// Stored task owned by `user_id`
async fn owned_task(state: &AppState, user_id: &str, task_key: &str) -> DomainResult<UserTask> {
    match state.tasks.find_by_id(task_key).await? {
        Some(task) if task.author_id == user_id => Ok(task),
        _ => Err(DomainError::NotFound(format!("task {}", task_key))),
    }
}

/// Reconciled task list, reconciling on first use
pub async fn list_tasks(state: &AppState, user_id: &str) -> DomainResult<Vec<UserTask>> {
    state.service.tasks_for(user_id).await
}

/// Force a reconciliation pass
pub async fn reconcile_tasks(state: &AppState, user_id: &str) -> DomainResult<Arc<Reconciliation>> {
    state.service.refresh(user_id).await
}

/// Create a custom task
pub async fn add_task(state: &AppState, user_id: &str, input: NewTask) -> DomainResult<UserTask> {
    let mut task = UserTask::new_custom(user_id, input.label.trim().to_string(), input.frequency, input.scope, input.amount);
    task.min_ilvl = input.min_ilvl;
    task.max_ilvl = input.max_ilvl;
    task.icon_path = input.icon_path;
    task.days_filter = input.days_filter;
    task.validate()?;

    task.key = state.tasks.create(&task).await?;
    state.service.refresh(user_id).await?;
    Ok(task)
}

/// Replace a stored task with an edited copy
pub async fn update_task(state: &AppState, user_id: &str, task: UserTask) -> DomainResult<UserTask> {
    let stored = owned_task(state, user_id, &task.key).await?;
    task.validate()?;
    if task.author_id != stored.author_id {
        return Err(DomainError::InvalidInput("tasks cannot change owner".to_string()));
    }

    state.tasks.set(&task).await?;
    state.service.refresh(user_id).await?;
    Ok(task)
}

/// Delete a task together with its completion records
pub async fn remove_task(state: &AppState, user_id: &str, task_key: &str) -> DomainResult<()> {
    owned_task(state, user_id, task_key).await?;

    // Records go first: if this fails the task is still there to retry with
    if state.completion.find_by_id(user_id).await?.is_some() {
        let mut batch = WriteBatch::new();
        batch.update(user_id, CompletionPatch::ForgetTask(task_key.to_string()));
        state.completion.commit(batch).await?;
    }
    state.tasks.delete(task_key).await?;

    state.service.refresh(user_id).await?;
    Ok(())
}

/// Enable or disable every task in `task_keys` in one batch
pub async fn set_track_all(state: &AppState, user_id: &str, task_keys: &[String], enabled: bool) -> DomainResult<usize> {
    let mut batch = WriteBatch::new();
    for key in task_keys {
        owned_task(state, user_id, key).await?;
        batch.update(key.clone(), TaskPatch { enabled: Some(enabled) });
    }
    if batch.is_empty() {
        return Ok(0);
    }

    let count = state.tasks.commit(batch).await?;
    state.service.refresh(user_id).await?;
    Ok(count)
}

/// Overwrite a whole list of the user's tasks atomically
pub async fn save_tasks(state: &AppState, user_id: &str, tasks: Vec<UserTask>) -> DomainResult<usize> {
    let mut batch = WriteBatch::new();
    for task in tasks {
        if task.key.is_empty() {
            return Err(DomainError::InvalidInput(format!("task {} has no key", task.label)));
        }
        if task.author_id != user_id {
            return Err(DomainError::InvalidInput(format!("task {} belongs to another user", task.label)));
        }
        task.validate()?;
        batch.set(task);
    }
    if batch.is_empty() {
        return Ok(0);
    }

    let count = state.tasks.commit(batch).await?;
    state.service.refresh(user_id).await?;
    Ok(count)
}

/// The user's custom tasks as a JSON array
pub async fn export_tasks(state: &AppState, user_id: &str) -> DomainResult<String> {
    let tasks = state.tasks.query(&TaskFilter::Author(user_id.to_string())).await?;
    let records: Vec<TaskRecord> = tasks.iter().filter(|t| t.custom).map(TaskRecord::from).collect();
    serde_json::to_string_pretty(&records).map_err(|e| DomainError::Internal(e.to_string()))
}

/// Import a JSON array of task records as new custom tasks.
///
/// Nothing is written unless every record is valid.
pub async fn import_tasks(state: &AppState, user_id: &str, payload: &str) -> DomainResult<usize> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| DomainError::InvalidInput(e.to_string()))?;
    if !value.is_array() {
        return Err(DomainError::InvalidInput("expected a list of tasks".to_string()));
    }
    let records: Vec<TaskRecord> =
        serde_json::from_value(value).map_err(|e| DomainError::InvalidInput(e.to_string()))?;
    if records.is_empty() {
        return Ok(0);
    }

    let mut batch = WriteBatch::new();
    for record in records {
        let task = record.into_task(user_id, state.tasks.generate_key());
        task.validate()?;
        batch.set(task);
    }

    let count = state.tasks.commit(batch).await?;
    log::info!("Imported {} tasks for {}", count, user_id);
    state.service.refresh(user_id).await?;
    Ok(count)
}
