//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for every stored record.
//! Records are identified by a string key, can be selected by a typed
//! filter and partially updated by a typed patch.

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone + 'static {
    /// Query predicate understood by repositories holding this entity
    type Filter: Send + Sync;
    /// Partial update applied by batched `update` operations
    type Patch: Send + Sync;

    /// Storage key of the record (empty until assigned)
    fn key(&self) -> &str;

    /// Replace the storage key
    fn set_key(&mut self, key: String);

    /// Whether this record is selected by `filter`
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Apply a partial update in place
    fn apply(&mut self, patch: &Self::Patch);
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
