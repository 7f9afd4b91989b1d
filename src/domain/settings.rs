//! User Settings
//!
//! Holds the lazy-tracking overrides: per (character, task) opt-outs from the
//! grace window granted to lazy characters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use super::completion::completion_key;
use super::entity::Entity;

/// "characterName:taskKey" -> enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LazyTracking(HashMap<String, bool>);

impl LazyTracking {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the user never configured this pair
    pub fn get(&self, character_name: &str, task_key: &str) -> Option<bool> {
        self.0.get(&completion_key(character_name, task_key)).copied()
    }

    pub fn set(&mut self, character_name: &str, task_key: &str, enabled: bool) {
        self.0.insert(completion_key(character_name, task_key), enabled);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub key: String,
    #[serde(default)]
    pub lazy_tracking: LazyTracking,
}

impl UserSettings {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            key: owner.into(),
            lazy_tracking: LazyTracking::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsPatch {
    LazyTracking {
        character_name: String,
        task_key: String,
        enabled: bool,
    },
}

impl Entity for UserSettings {
    type Filter = ();
    type Patch = SettingsPatch;

    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn apply(&mut self, patch: &SettingsPatch) {
        match patch {
            SettingsPatch::LazyTracking { character_name, task_key, enabled } => {
                self.lazy_tracking.set(character_name, task_key, *enabled)
            }
        }
    }
}
