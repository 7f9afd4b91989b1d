//! Completion Records
//!
//! One `CompletionBook` per user holds the progress of every
//! (character, task) pair. Records are overwritten on progress and only
//! removed together with their task.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Progress of one character on one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub amount: u32,
    /// Epoch milliseconds of the last change
    pub updated: i64,
}

/// Key of a record inside a book
pub fn completion_key(character_name: &str, task_key: &str) -> String {
    format!("{}:{}", character_name, task_key)
}

/// All completion records of one user, keyed by the user id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionBook {
    pub key: String,
    pub data: HashMap<String, CompletionRecord>,
}

impl CompletionBook {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            key: owner.into(),
            data: HashMap::new(),
        }
    }

    pub fn entry(&self, character_name: &str, task_key: &str) -> Option<&CompletionRecord> {
        self.data.get(&completion_key(character_name, task_key))
    }

    pub fn record(&mut self, character_name: &str, task_key: &str, record: CompletionRecord) {
        self.data.insert(completion_key(character_name, task_key), record);
    }

    /// Drop every record belonging to `task_key`
    pub fn forget_task(&mut self, task_key: &str) {
        let suffix = format!(":{}", task_key);
        self.data.retain(|k, _| !k.ends_with(&suffix));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionPatch {
    Set {
        character_name: String,
        task_key: String,
        record: CompletionRecord,
    },
    ForgetTask(String),
}

impl Entity for CompletionBook {
    type Filter = ();
    type Patch = CompletionPatch;

    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn apply(&mut self, patch: &CompletionPatch) {
        match patch {
            CompletionPatch::Set { character_name, task_key, record } => {
                self.record(character_name, task_key, *record)
            }
            CompletionPatch::ForgetTask(task_key) => self.forget_task(task_key),
        }
    }
}
