//! Completion Commands

use serde::Serialize;

use crate::clock::Clock;
use crate::domain::{Character, CompletionBook, CompletionRecord, DomainError, DomainResult, UserTask};
use crate::engine::{evaluate, TaskStatus};
use crate::repository::Repository;
use crate::AppState;

/// One task with every roster character's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistRow {
    pub task: UserTask,
    pub characters: Vec<CharacterStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStatus {
    pub character: String,
    pub status: TaskStatus,
    pub complete: bool,
}

async fn character_and_task(state: &AppState, user_id: &str, character_name: &str, task_key: &str) -> DomainResult<(Character, UserTask)> {
    let roster = state.rosters.find_by_id(user_id).await?.unwrap_or_default();
    let character = roster
        .character(character_name)
        .cloned()
        .ok_or_else(|| DomainError::NotFound(format!("character {}", character_name)))?;
    let task = match state.tasks.find_by_id(task_key).await? {
        Some(task) if task.author_id == user_id => task,
        _ => return Err(DomainError::NotFound(format!("task {}", task_key))),
    };
    Ok((character, task))
}

async fn write_record(state: &AppState, user_id: &str, character_name: &str, task_key: &str, amount: u32) -> DomainResult<CompletionRecord> {
    let mut book = state
        .completion
        .find_by_id(user_id)
        .await?
        .unwrap_or_else(|| CompletionBook::new(user_id));
    let record = CompletionRecord {
        amount,
        updated: state.clock.now_millis(),
    };
    book.record(character_name, task_key, record);
    state.completion.set(&book).await?;
    Ok(record)
}

/// Overwrite a character's progress on a task
pub async fn set_completion(
    state: &AppState,
    user_id: &str,
    character_name: &str,
    task_key: &str,
    amount: u32,
) -> DomainResult<CompletionRecord> {
    let (_, task) = character_and_task(state, user_id, character_name, task_key).await?;
    write_record(state, user_id, character_name, task_key, amount.min(task.amount)).await
}

/// Add one unit of progress in the current period, up to the task amount
pub async fn increment_completion(
    state: &AppState,
    user_id: &str,
    character_name: &str,
    task_key: &str,
) -> DomainResult<CompletionRecord> {
    let (character, task) = character_and_task(state, user_id, character_name, task_key).await?;
    let book = state.completion.find_by_id(user_id).await?.unwrap_or_default();
    let settings = state.settings.find_by_id(user_id).await?.unwrap_or_default();

    let status = evaluate(&task, &character, &book, &state.clock.boundaries(), &settings.lazy_tracking);
    let done = match status {
        TaskStatus::Excluded => {
            return Err(DomainError::InvalidInput(format!("{} does not run today", task.label)));
        }
        TaskStatus::Progress(done) => done,
    };
    write_record(state, user_id, character_name, task_key, (done + 1).min(task.amount)).await
}

/// Status of every enabled task for every roster character
pub async fn checklist(state: &AppState, user_id: &str) -> DomainResult<Vec<ChecklistRow>> {
    let tasks = state.service.tasks_for(user_id).await?;
    let roster = state.rosters.find_by_id(user_id).await?.unwrap_or_default();
    let book = state.completion.find_by_id(user_id).await?.unwrap_or_default();
    let settings = state.settings.find_by_id(user_id).await?.unwrap_or_default();
    let resets = state.clock.boundaries();

    let rows = tasks
        .into_iter()
        .filter(|task| task.enabled)
        .map(|task| {
            let characters = roster
                .characters
                .iter()
                .filter(|c| task.accepts_ilvl(c.ilvl))
                .map(|c| {
                    let status = evaluate(&task, c, &book, &resets, &settings.lazy_tracking);
                    CharacterStatus {
                        character: c.name.clone(),
                        status,
                        complete: status.is_complete(task.amount),
                    }
                })
                .collect();
            ChecklistRow { task, characters }
        })
        .collect();
    Ok(rows)
}
