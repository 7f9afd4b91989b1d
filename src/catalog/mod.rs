//! Task Catalog
//!
//! The versioned, ordered list of default task definitions, plus the subtask
//! table used to split tasks into item level brackets. Both are immutable
//! once loaded.

mod subtasks;
mod tasks;

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{
    DomainError, DomainResult, TaskDefinition, TaskFrequency, TaskScope, MAX_ILVL,
};

pub use subtasks::builtin_subtasks;
pub use tasks::CATALOG_VERSION;

/// One catalog entry as written in a catalog file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub label: String,
    pub frequency: TaskFrequency,
    pub scope: TaskScope,
    #[serde(default)]
    pub min_ilvl: u32,
    #[serde(default = "default_max_ilvl")]
    pub max_ilvl: u32,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub days_filter: Vec<u8>,
    #[serde(default)]
    pub shared: bool,
}

fn default_max_ilvl() -> u32 {
    MAX_ILVL
}

fn default_amount() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    tasks: Vec<CatalogEntry>,
}

/// Ordered task definitions sharing one catalog version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    version: u32,
    tasks: Vec<TaskDefinition>,
}

impl Catalog {
    /// Build a catalog; entry order becomes the catalog index
    pub fn new(version: u32, entries: Vec<CatalogEntry>) -> Self {
        let tasks = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| TaskDefinition {
                label: entry.label,
                frequency: entry.frequency,
                scope: entry.scope,
                min_ilvl: entry.min_ilvl,
                max_ilvl: entry.max_ilvl,
                amount: entry.amount,
                icon_path: entry.icon_path,
                days_filter: entry.days_filter,
                shared: entry.shared,
                catalog_version: version,
                catalog_index: index,
            })
            .collect();
        Self { version, tasks }
    }

    /// The catalog shipped with the application
    pub fn builtin() -> Self {
        Self::new(CATALOG_VERSION, tasks::builtin_entries())
    }

    /// Parse and validate a JSON catalog (`{"version": n, "tasks": [...]}`)
    pub fn from_json(json: &str) -> DomainResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| DomainError::InvalidInput(format!("catalog: {}", e)))?;
        let catalog = Self::new(file.version, file.tasks);
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Definition matching a stored task on (label, frequency)
    pub fn find(&self, label: &str, frequency: TaskFrequency) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|def| def.same_task(label, frequency))
    }

    /// Check the invariants reconciliation relies on
    pub fn validate(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for def in &self.tasks {
            if def.label.trim().is_empty() {
                return Err(DomainError::InvalidInput(format!(
                    "catalog entry {} has an empty label",
                    def.catalog_index
                )));
            }
            if !seen.insert((def.label.as_str(), def.frequency)) {
                return Err(DomainError::Conflict(format!(
                    "duplicate catalog task {} ({})",
                    def.label,
                    def.frequency.as_str()
                )));
            }
            if def.min_ilvl > def.max_ilvl || def.max_ilvl > MAX_ILVL {
                return Err(DomainError::InvalidInput(format!(
                    "{}: invalid item level range {}..={}",
                    def.label, def.min_ilvl, def.max_ilvl
                )));
            }
            if def.amount == 0 {
                return Err(DomainError::InvalidInput(format!("{}: amount must be at least 1", def.label)));
            }
            if def.days_filter.iter().any(|d| *d > 6) {
                return Err(DomainError::InvalidInput(format!("{}: weekday index out of range", def.label)));
            }
        }
        Ok(())
    }
}
