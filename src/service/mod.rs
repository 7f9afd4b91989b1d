//! Service Layer
//!
//! Wires the pure engine to storage:
//! - coalescer: debounced, batched writes of reconciliation output
//! - cleanup: one-shot removal of an anonymous identity's tasks
//! - friends: cached friend documents for the sharing matcher
//!
//! `TaskService` is the reconciliation feed. Every `refresh` recomputes the
//! user's reconciled task list from current storage, hands the create and
//! update sets to the writer and publishes the result. Subscribers always
//! start from the last published value.

mod cleanup;
mod coalescer;
mod friends;

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::time::Duration;

use crate::catalog::Catalog;
use crate::config::SyncConfig;
use crate::domain::{DomainResult, TaskFilter, UserTask};
use crate::engine::{reconcile, Reconciliation};
use crate::repository::{ReadCache, Repository, WriteBatch};

pub use cleanup::{CleanupRegistry, Identity, IdentityTransition};
pub use coalescer::{CoalescingWriter, FlushReport, WriteKind, WriterStatus};
pub use friends::FriendCache;

pub struct TaskService {
    tasks: Arc<dyn Repository<UserTask>>,
    catalog: Arc<Catalog>,
    writer: CoalescingWriter,
    feed: ReadCache<Arc<Reconciliation>>,
    cleanup: Mutex<CleanupRegistry>,
}

impl TaskService {
    /// Must be called inside a tokio runtime (spawns the writer)
    pub fn new(tasks: Arc<dyn Repository<UserTask>>, catalog: Arc<Catalog>, sync: &SyncConfig) -> Self {
        let writer = CoalescingWriter::spawn(tasks.clone(), Duration::from_millis(sync.debounce_ms));
        Self {
            tasks,
            catalog,
            writer,
            feed: ReadCache::new(),
            cleanup: Mutex::new(CleanupRegistry::new(sync.cleanup_registry_capacity)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Re-run reconciliation for `user_id` against stored tasks
    pub async fn refresh(&self, user_id: &str) -> DomainResult<Arc<Reconciliation>> {
        let stored = self.tasks.query(&TaskFilter::Author(user_id.to_string())).await?;
        let reconciliation = reconcile(&self.catalog, &stored, user_id, || self.tasks.generate_key());

        if !reconciliation.is_settled() {
            log::debug!(
                "reconciled {}: {} to create, {} to update",
                user_id,
                reconciliation.to_create.len(),
                reconciliation.to_update.len()
            );
        }
        self.writer.submit_create(user_id, reconciliation.to_create.clone());
        self.writer.submit_update(user_id, reconciliation.to_update.clone());

        let reconciliation = Arc::new(reconciliation);
        self.feed.publish(user_id, reconciliation.clone()).await;
        Ok(reconciliation)
    }

    /// Receiver replaying the latest reconciliation for `user_id`
    pub async fn subscribe(&self, user_id: &str) -> watch::Receiver<Option<Arc<Reconciliation>>> {
        self.feed.subscribe(user_id).await
    }

    /// Last published reconciliation, if any
    pub async fn latest(&self, user_id: &str) -> Option<Arc<Reconciliation>> {
        self.feed.get(user_id).await
    }

    /// The user's reconciled tasks, reconciling on first use
    pub async fn tasks_for(&self, user_id: &str) -> DomainResult<Vec<UserTask>> {
        match self.latest(user_id).await {
            Some(latest) => Ok(latest.result.clone()),
            None => Ok(self.refresh(user_id).await?.result.clone()),
        }
    }

    /// Write pending creates and updates now
    pub async fn flush(&self) -> DomainResult<FlushReport> {
        self.writer.flush().await
    }

    pub fn writer_status(&self) -> watch::Receiver<WriterStatus> {
        self.writer.status()
    }

    /// React to a change of the signed-in identity.
    ///
    /// Going from an anonymous identity to a different signed-in one deletes
    /// the anonymous identity's tasks in one batch, once per transition.
    /// Returns the number of deleted tasks.
    pub async fn on_identity_change(&self, previous: Option<&Identity>, current: &Identity) -> DomainResult<usize> {
        let previous = match previous {
            Some(previous) => previous,
            None => return Ok(0),
        };
        let transition = IdentityTransition::new(previous, current);
        if !transition.requires_cleanup() {
            return Ok(0);
        }

        let key = transition.registry_key();
        if !self.cleanup.lock().await.claim(&key) {
            log::debug!("cleanup for {} already handled", key);
            return Ok(0);
        }

        match self.delete_tasks_of(&previous.uid).await {
            Ok(count) => {
                log::info!("Deleted {} tasks for cleanup", count);
                Ok(count)
            }
            Err(e) => {
                // Let a later observation of the same transition try again
                self.cleanup.lock().await.release(&key);
                log::error!("cleanup for {} failed: {}", key, e);
                Err(e)
            }
        }
    }

    async fn delete_tasks_of(&self, uid: &str) -> DomainResult<usize> {
        let tasks = self.tasks.query(&TaskFilter::Author(uid.to_string())).await?;
        if tasks.is_empty() {
            return Ok(0);
        }
        let mut batch = WriteBatch::new();
        for task in tasks {
            batch.delete(task.key);
        }
        self.tasks.commit(batch).await
    }
}
