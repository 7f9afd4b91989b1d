//! Task Entities
//!
//! `TaskDefinition` is a catalog entry shipped with the application.
//! `UserTask` is a user's stored copy of a definition (or a task the user
//! authored), the unit the reconciliation engine works on.

use serde::{Deserialize, Serialize};
use super::entity::{DomainError, DomainResult, Entity};

/// Item level used as "no upper bound"
pub const MAX_ILVL: u32 = 9999;

/// How often a task's progress resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    #[default]
    Daily,
    Weekly,
}

impl TaskFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFrequency::Daily => "daily",
            TaskFrequency::Weekly => "weekly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(TaskFrequency::Daily),
            "weekly" => Some(TaskFrequency::Weekly),
            _ => None,
        }
    }
}

/// Whether progress is tracked per character or once per roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskScope {
    #[default]
    Character,
    Roster,
}

impl TaskScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskScope::Character => "character",
            TaskScope::Roster => "roster",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "character" => Some(TaskScope::Character),
            "roster" => Some(TaskScope::Roster),
            _ => None,
        }
    }
}

/// A default task shipped in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub label: String,
    pub frequency: TaskFrequency,
    pub scope: TaskScope,
    pub min_ilvl: u32,
    pub max_ilvl: u32,
    /// Units required to complete the task
    pub amount: u32,
    pub icon_path: Option<String>,
    /// Allowed weekday indices (Sunday = 0); empty means every day
    pub days_filter: Vec<u8>,
    /// Eligible for help from friends' rosters
    pub shared: bool,
    pub catalog_version: u32,
    /// Stable ordering key within the catalog
    pub catalog_index: usize,
}

impl TaskDefinition {
    /// Whether this definition is the catalog counterpart of a stored task
    pub fn same_task(&self, label: &str, frequency: TaskFrequency) -> bool {
        self.label == label && self.frequency == frequency
    }
}

/// A task owned by one user
///
/// Non-custom tasks mirror a catalog definition and are upgraded when the
/// catalog version moves; custom tasks are never touched by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTask {
    /// Storage identity
    pub key: String,
    pub author_id: String,
    pub label: String,
    pub frequency: TaskFrequency,
    pub scope: TaskScope,
    pub min_ilvl: u32,
    pub max_ilvl: u32,
    pub amount: u32,
    pub icon_path: Option<String>,
    pub days_filter: Vec<u8>,
    pub shared: bool,
    pub enabled: bool,
    pub custom: bool,
    /// Last catalog version applied to this record
    pub version: u32,
    /// Catalog index, absent for tasks the user authored
    pub index: Option<usize>,
}

impl UserTask {
    /// Create a custom task with default values
    pub fn new_custom(
        author_id: &str,
        label: String,
        frequency: TaskFrequency,
        scope: TaskScope,
        amount: u32,
    ) -> Self {
        Self {
            key: String::new(),
            author_id: author_id.to_string(),
            label,
            frequency,
            scope,
            min_ilvl: 0,
            max_ilvl: MAX_ILVL,
            amount,
            icon_path: None,
            days_filter: Vec::new(),
            shared: false,
            enabled: true,
            custom: true,
            version: 0,
            index: None,
        }
    }

    /// Materialize a catalog definition for `author_id`
    pub fn from_definition(def: &TaskDefinition, key: String, author_id: &str, version: u32) -> Self {
        Self {
            key,
            author_id: author_id.to_string(),
            label: def.label.clone(),
            frequency: def.frequency,
            scope: def.scope,
            min_ilvl: def.min_ilvl,
            max_ilvl: def.max_ilvl,
            amount: def.amount,
            icon_path: def.icon_path.clone(),
            days_filter: def.days_filter.clone(),
            shared: def.shared,
            enabled: true,
            custom: false,
            version,
            index: Some(def.catalog_index),
        }
    }

    /// Rebuild a stored copy from its (newer) catalog definition.
    ///
    /// Key, item level range, enabled flag and author come from the stored
    /// record; everything else from the definition.
    pub fn upgraded_from(def: &TaskDefinition, stored: &UserTask, version: u32) -> Self {
        Self {
            key: stored.key.clone(),
            author_id: stored.author_id.clone(),
            label: def.label.clone(),
            frequency: def.frequency,
            scope: def.scope,
            min_ilvl: stored.min_ilvl,
            max_ilvl: stored.max_ilvl,
            amount: def.amount,
            icon_path: def.icon_path.clone(),
            days_filter: def.days_filter.clone(),
            shared: def.shared,
            enabled: stored.enabled,
            custom: false,
            version,
            index: Some(def.catalog_index),
        }
    }

    /// Freeze a task whose definition left the catalog into a custom task
    pub fn frozen(&self, version: u32) -> Self {
        Self {
            custom: true,
            version,
            ..self.clone()
        }
    }

    pub fn same_task(&self, label: &str, frequency: TaskFrequency) -> bool {
        self.label == label && self.frequency == frequency
    }

    /// Inclusive item level check
    pub fn accepts_ilvl(&self, ilvl: u32) -> bool {
        ilvl >= self.min_ilvl && ilvl <= self.max_ilvl
    }

    /// Check user-editable fields
    pub fn validate(&self) -> DomainResult<()> {
        if self.label.trim().is_empty() {
            return Err(DomainError::InvalidInput("task label is empty".to_string()));
        }
        if self.max_ilvl > MAX_ILVL || self.min_ilvl > self.max_ilvl {
            return Err(DomainError::InvalidInput(format!(
                "{}: item level range {}..={} is outside 0..={}",
                self.label, self.min_ilvl, self.max_ilvl, MAX_ILVL
            )));
        }
        if self.amount == 0 {
            return Err(DomainError::InvalidInput(format!("{}: amount must be at least 1", self.label)));
        }
        if let Some(day) = self.days_filter.iter().find(|d| **d > 6) {
            return Err(DomainError::InvalidInput(format!("{}: invalid weekday {}", self.label, day)));
        }
        Ok(())
    }
}

/// Query filter for stored tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Author(String),
}

/// Partial update for stored tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub enabled: Option<bool>,
}

impl Entity for UserTask {
    type Filter = TaskFilter;
    type Patch = TaskPatch;

    fn key(&self) -> &str {
        &self.key
    }

    fn set_key(&mut self, key: String) {
        self.key = key;
    }

    fn matches(&self, filter: &TaskFilter) -> bool {
        match filter {
            TaskFilter::All => true,
            TaskFilter::Author(author) => &self.author_id == author,
        }
    }

    fn apply(&mut self, patch: &TaskPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }
}
