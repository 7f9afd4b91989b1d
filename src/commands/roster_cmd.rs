//! Roster and Settings Commands

use std::collections::HashSet;

use crate::domain::{Character, DomainError, DomainResult, Entity, Roster, RosterPatch, SettingsPatch, UserSettings};
use crate::repository::{Repository, WriteBatch};
use crate::AppState;

fn validate_characters(characters: &[Character]) -> DomainResult<()> {
    let mut names = HashSet::new();
    for character in characters {
        if character.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("character name is empty".to_string()));
        }
        if !names.insert(character.name.as_str()) {
            return Err(DomainError::Conflict(format!("character {} listed twice", character.name)));
        }
    }
    Ok(())
}

pub async fn get_roster(state: &AppState, user_id: &str) -> DomainResult<Roster> {
    Ok(state
        .rosters
        .find_by_id(user_id)
        .await?
        .unwrap_or_else(|| Roster::new(user_id, Vec::new())))
}

/// Replace the whole roster, keeping the given order
pub async fn save_roster(state: &AppState, user_id: &str, characters: Vec<Character>) -> DomainResult<Roster> {
    validate_characters(&characters)?;
    let roster = Roster::new(user_id, characters);
    state.rosters.set(&roster).await?;
    Ok(roster)
}

/// Insert or replace one character by name
pub async fn upsert_character(state: &AppState, user_id: &str, character: Character) -> DomainResult<Roster> {
    validate_characters(std::slice::from_ref(&character))?;
    if state.rosters.find_by_id(user_id).await?.is_none() {
        return save_roster(state, user_id, vec![character]).await;
    }

    let mut batch = WriteBatch::new();
    batch.update(user_id, RosterPatch::Upsert(character));
    state.rosters.commit(batch).await?;
    get_roster(state, user_id).await
}

pub async fn remove_character(state: &AppState, user_id: &str, character_name: &str) -> DomainResult<Roster> {
    let roster = get_roster(state, user_id).await?;
    if roster.character(character_name).is_none() {
        return Err(DomainError::NotFound(format!("character {}", character_name)));
    }

    let mut batch = WriteBatch::new();
    batch.update(user_id, RosterPatch::Remove(character_name.to_string()));
    state.rosters.commit(batch).await?;
    get_roster(state, user_id).await
}

/// Opt a (character, task) pair in or out of the lazy grace window
pub async fn set_lazy_tracking(
    state: &AppState,
    user_id: &str,
    character_name: &str,
    task_key: &str,
    enabled: bool,
) -> DomainResult<UserSettings> {
    let patch = SettingsPatch::LazyTracking {
        character_name: character_name.to_string(),
        task_key: task_key.to_string(),
        enabled,
    };

    match state.settings.find_by_id(user_id).await? {
        Some(_) => {
            let mut batch = WriteBatch::new();
            batch.update(user_id, patch);
            state.settings.commit(batch).await?;
        }
        None => {
            let mut settings = UserSettings::new(user_id);
            settings.apply(&patch);
            state.settings.set(&settings).await?;
        }
    }

    Ok(state
        .settings
        .find_by_id(user_id)
        .await?
        .unwrap_or_else(|| UserSettings::new(user_id)))
}
