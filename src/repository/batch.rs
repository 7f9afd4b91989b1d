//! Atomic write batches

use crate::domain::Entity;

/// One operation of a batch
pub enum WriteOp<T: Entity> {
    /// Insert or overwrite under the entity's own key
    Set(T),
    /// Patch an existing record; a missing key fails the whole batch
    Update { key: String, patch: T::Patch },
    Delete { key: String },
}

impl<T: Entity> WriteOp<T> {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set(entity) => entity.key(),
            WriteOp::Update { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// Ordered operations committed all-or-nothing
pub struct WriteBatch<T: Entity> {
    ops: Vec<WriteOp<T>>,
}

impl<T: Entity> Default for WriteBatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> WriteBatch<T> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn set(&mut self, entity: T) -> &mut Self {
        self.ops.push(WriteOp::Set(entity));
        self
    }

    pub fn update(&mut self, key: impl Into<String>, patch: T::Patch) -> &mut Self {
        self.ops.push(WriteOp::Update { key: key.into(), patch });
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp<T>] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp<T>> {
        self.ops
    }
}

impl<T: Entity> FromIterator<WriteOp<T>> for WriteBatch<T> {
    fn from_iter<I: IntoIterator<Item = WriteOp<T>>>(iter: I) -> Self {
        Self { ops: iter.into_iter().collect() }
    }
}
