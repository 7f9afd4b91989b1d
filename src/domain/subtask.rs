//! Subtask Entity
//!
//! A subtask names one item-level tier of a parent task (a specific guardian,
//! abyss difficulty or raid phase).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub name: String,
    /// Label of the parent task
    pub parent_name: String,
    pub banner: Option<String>,
    pub min_ilvl: u32,
}

impl Subtask {
    pub fn new(name: &str, parent_name: &str, banner: &str, min_ilvl: u32) -> Self {
        Self {
            name: name.to_string(),
            parent_name: parent_name.to_string(),
            banner: Some(banner.to_string()),
            min_ilvl,
        }
    }
}
