//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod batch;
mod db;
mod task_repo;
mod document_repo;
mod memory;
mod cache;


pub use traits::Repository;
pub use batch::{WriteBatch, WriteOp};
pub use db::{init_db, DbState};
pub use task_repo::TaskRepository;
pub use document_repo::{Document, DocumentRepository};
pub use memory::MemoryRepository;
pub use cache::ReadCache;
