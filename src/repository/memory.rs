//! In-memory repository
//!
//! Keeps records in insertion order behind a `RwLock`. Used for tests and
//! for running the engine without a database file.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DomainError, DomainResult, Entity};
use super::batch::{WriteBatch, WriteOp};
use super::traits::Repository;

pub struct MemoryRepository<T: Entity> {
    records: RwLock<Vec<T>>,
    fail_writes: AtomicBool,
    commits: AtomicUsize,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
            fail_writes: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
        }
    }

    /// Make every following write fail with a storage error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful batch commits so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.records.read().await.clone()
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DomainError::Storage("writes are disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

fn upsert<T: Entity>(records: &mut Vec<T>, entity: T) {
    match records.iter_mut().find(|r| r.key() == entity.key()) {
        Some(existing) => *existing = entity,
        None => records.push(entity),
    }
}

fn apply_op<T: Entity>(records: &mut Vec<T>, op: WriteOp<T>) -> DomainResult<()> {
    match op {
        WriteOp::Set(entity) => {
            if entity.key().is_empty() {
                return Err(DomainError::InvalidInput("batch set without a key".to_string()));
            }
            upsert(records, entity);
        }
        WriteOp::Update { key, patch } => {
            let record = records
                .iter_mut()
                .find(|r| r.key() == key)
                .ok_or_else(|| DomainError::NotFound(key.clone()))?;
            record.apply(&patch);
        }
        WriteOp::Delete { key } => records.retain(|r| r.key() != key),
    }
    Ok(())
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn find_by_id(&self, key: &str) -> DomainResult<Option<T>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.key() == key).cloned())
    }

    async fn query(&self, filter: &T::Filter) -> DomainResult<Vec<T>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.matches(filter)).cloned().collect())
    }

    async fn create(&self, entity: &T) -> DomainResult<String> {
        self.check_writable()?;
        let mut records = self.records.write().await;

        let mut entity = entity.clone();
        if entity.key().is_empty() {
            entity.set_key(self.generate_key());
        } else if records.iter().any(|r| r.key() == entity.key()) {
            return Err(DomainError::Conflict(format!("key {} already exists", entity.key())));
        }
        let key = entity.key().to_string();
        records.push(entity);
        Ok(key)
    }

    async fn set(&self, entity: &T) -> DomainResult<()> {
        self.check_writable()?;
        if entity.key().is_empty() {
            return Err(DomainError::InvalidInput("set without a key".to_string()));
        }
        upsert(&mut *self.records.write().await, entity.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        self.check_writable()?;
        self.records.write().await.retain(|r| r.key() != key);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch<T>) -> DomainResult<usize> {
        self.check_writable()?;
        let mut records = self.records.write().await;

        // Work on a copy so a failing op leaves the store untouched
        let mut staged = records.clone();
        let count = batch.len();
        for op in batch.into_ops() {
            apply_op(&mut staged, op)?;
        }
        *records = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(count)
    }
}
