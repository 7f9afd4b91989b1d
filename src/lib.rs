//! Roster Tasks Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - catalog: Shipped default tasks and subtask brackets
//! - engine: Reconciliation, completion evaluation, brackets, friend matching
//! - repository: Data access abstractions and implementations
//! - service: Reconciliation feed, batched writer, identity cleanup
//! - commands: One function per user action

use std::sync::Arc;

pub mod catalog;
pub mod clock;
pub mod commands;
pub mod config;
pub mod domain;
pub mod engine;
pub mod repository;
pub mod service;

use catalog::Catalog;
use clock::{Clock, ServerClock};
use config::{Config, SyncConfig};
use domain::{CompletionBook, DomainResult, Roster, Subtask, UserSettings, UserTask};
use repository::{init_db, DocumentRepository, MemoryRepository, Repository, TaskRepository};
use service::{FriendCache, TaskService};

/// Application state shared across commands
pub struct AppState {
    pub tasks: Arc<dyn Repository<UserTask>>,
    pub rosters: Arc<dyn Repository<Roster>>,
    pub completion: Arc<dyn Repository<CompletionBook>>,
    pub settings: Arc<dyn Repository<UserSettings>>,
    pub subtasks: Arc<Vec<Subtask>>,
    pub clock: Arc<dyn Clock>,
    pub service: TaskService,
    pub friends: FriendCache,
}

/// The stores an `AppState` is built from
pub struct Stores {
    pub tasks: Arc<dyn Repository<UserTask>>,
    pub rosters: Arc<dyn Repository<Roster>>,
    pub completion: Arc<dyn Repository<CompletionBook>>,
    pub settings: Arc<dyn Repository<UserSettings>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            tasks: Arc::new(MemoryRepository::new()),
            rosters: Arc::new(MemoryRepository::new()),
            completion: Arc::new(MemoryRepository::new()),
            settings: Arc::new(MemoryRepository::new()),
        }
    }
}

impl AppState {
    /// Open the SQLite database and catalog named by `config`
    pub async fn open(config: &Config) -> DomainResult<Self> {
        let db_state = init_db(&config.database.path).await?;
        let conn = db_state.connection();
        let stores = Stores {
            tasks: Arc::new(TaskRepository::new(conn.clone())),
            rosters: Arc::new(DocumentRepository::new(conn.clone())),
            completion: Arc::new(DocumentRepository::new(conn.clone())),
            settings: Arc::new(DocumentRepository::new(conn)),
        };

        let catalog = match &config.catalog.path {
            Some(path) => Catalog::from_file(path)?,
            None => Catalog::builtin(),
        };
        log::info!(
            "catalog v{} with {} tasks, database {}",
            catalog.version(),
            catalog.len(),
            config.database.path.display()
        );

        Ok(Self::assemble(
            stores,
            catalog,
            Arc::new(ServerClock::new(&config.reset)),
            &config.sync,
        ))
    }

    /// Must be called inside a tokio runtime
    pub fn assemble(stores: Stores, catalog: Catalog, clock: Arc<dyn Clock>, sync: &SyncConfig) -> Self {
        let service = TaskService::new(stores.tasks.clone(), Arc::new(catalog), sync);
        let friends = FriendCache::new(
            stores.tasks.clone(),
            stores.rosters.clone(),
            stores.completion.clone(),
            stores.settings.clone(),
        );
        Self {
            tasks: stores.tasks,
            rosters: stores.rosters,
            completion: stores.completion,
            settings: stores.settings,
            subtasks: Arc::new(crate::catalog::builtin_subtasks()),
            clock,
            service,
            friends,
        }
    }
}
