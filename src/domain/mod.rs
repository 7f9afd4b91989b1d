//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no storage dependencies (serde only).

mod entity;
mod task;
mod character;
mod completion;
mod settings;
mod subtask;
mod reset;

pub use entity::{Entity, DomainError, DomainResult};
pub use task::{TaskDefinition, TaskFilter, TaskFrequency, TaskPatch, TaskScope, UserTask, MAX_ILVL};
pub use character::{Character, Roster, RosterPatch};
pub use completion::{completion_key, CompletionBook, CompletionPatch, CompletionRecord};
pub use settings::{LazyTracking, SettingsPatch, UserSettings};
pub use subtask::Subtask;
pub use reset::{ResetBoundaries, DAY_MS, HOUR_MS};
