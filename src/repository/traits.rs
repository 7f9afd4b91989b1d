//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{DomainResult, Entity};
use super::batch::WriteBatch;

/// Core repository trait for keyed records
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Fresh storage key for a record about to be created
    fn generate_key(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Find entity by key
    async fn find_by_id(&self, key: &str) -> DomainResult<Option<T>>;

    /// All entities selected by `filter`, in storage order
    async fn query(&self, filter: &T::Filter) -> DomainResult<Vec<T>>;

    /// Insert a new entity and return its key.
    ///
    /// An empty key is replaced by a generated one; an existing key is a
    /// conflict.
    async fn create(&self, entity: &T) -> DomainResult<String>;

    /// Insert or overwrite the entity stored under its key
    async fn set(&self, entity: &T) -> DomainResult<()>;

    /// Delete entity by key; deleting a missing key is not an error
    async fn delete(&self, key: &str) -> DomainResult<()>;

    /// Apply every operation of `batch` or none of them.
    ///
    /// Returns the number of operations applied.
    async fn commit(&self, batch: WriteBatch<T>) -> DomainResult<usize>;
}
