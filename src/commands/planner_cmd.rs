//! Party Planner Commands

use crate::clock::Clock;
use crate::domain::DomainResult;
use crate::engine::{match_shared_tasks, shareable_tasks, PlannerTask, SharingBoard, SharingInput};
use crate::repository::Repository;
use crate::AppState;

/// Shared tasks the user's roster can run, split into brackets
pub async fn planner_tasks(state: &AppState, user_id: &str) -> DomainResult<Vec<PlannerTask>> {
    let tasks = state.service.tasks_for(user_id).await?;
    let roster = state.rosters.find_by_id(user_id).await?.unwrap_or_default();
    Ok(shareable_tasks(&tasks, &state.subtasks, &roster))
}

/// Who among `friend_ids` can still help with each planner task
pub async fn party_planner(state: &AppState, user_id: &str, friend_ids: &[String]) -> DomainResult<SharingBoard> {
    let tasks = planner_tasks(state, user_id).await?;
    let roster = state.rosters.find_by_id(user_id).await?.unwrap_or_default();
    let completion = state.completion.find_by_id(user_id).await?.unwrap_or_default();
    let settings = state.settings.find_by_id(user_id).await?.unwrap_or_default();
    let friends = state.friends.friends(friend_ids).await;
    let resets = state.clock.boundaries();

    let input = SharingInput {
        tasks: &tasks,
        roster: &roster,
        completion: &completion,
        resets: &resets,
        lazy_tracking: &settings.lazy_tracking,
    };
    Ok(match_shared_tasks(&input, &friends))
}
