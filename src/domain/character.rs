//! Character and Roster Entities

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// A player character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique within its roster
    pub name: String,
    pub ilvl: u32,
    /// Opted in to the lazy-tracking grace window
    #[serde(default)]
    pub lazy: bool,
    /// Hidden from friends
    #[serde(default)]
    pub is_private: bool,
}

impl Character {
    pub fn new(name: impl Into<String>, ilvl: u32) -> Self {
        Self {
            name: name.into(),
            ilvl,
            lazy: false,
            is_private: false,
        }
    }
}

/// Ordered characters owned by one user, keyed by the user id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub key: String,
    pub characters: Vec<Character>,
}

impl Roster {
    pub fn new(owner: impl Into<String>, characters: Vec<Character>) -> Self {
        Self {
            key: owner.into(),
            characters,
        }
    }

    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }
}

/// Partial updates for a roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterPatch {
    /// Insert or replace a character by name
    Upsert(Character),
    Remove(String),
}

impl Entity for Roster {
    type Filter = ();
    type Patch = RosterPatch;

    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn apply(&mut self, patch: &RosterPatch) {
        match patch {
            RosterPatch::Upsert(character) => {
                match self.characters.iter_mut().find(|c| c.name == character.name) {
                    Some(existing) => *existing = character.clone(),
                    None => self.characters.push(character.clone()),
                }
            }
            RosterPatch::Remove(name) => self.characters.retain(|c| &c.name != name),
        }
    }
}
