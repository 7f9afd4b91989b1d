//! Task Repository
//!
//! SQLite-backed storage for `UserTask` rows, one row per task.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Entity, TaskFilter, TaskFrequency, TaskScope, UserTask};
use super::batch::{WriteBatch, WriteOp};
use super::traits::Repository;

const TASK_COLUMNS: &str = "key, author_id, label, frequency, scope, min_ilvl, max_ilvl, amount, \
     icon_path, days_filter, shared, enabled, custom, version, catalog_index";

/// SQLite implementation of the task repository
pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn unknown_value(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, format!("unknown value {:?}", value).into())
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserTask> {
    let frequency: String = row.get(3)?;
    let frequency = TaskFrequency::parse(&frequency).ok_or_else(|| unknown_value(3, &frequency))?;
    let scope: String = row.get(4)?;
    let scope = TaskScope::parse(&scope).ok_or_else(|| unknown_value(4, &scope))?;
    let days: String = row.get(9)?;
    let days_filter = serde_json::from_str(&days)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;
    let catalog_index: Option<i64> = row.get(14)?;

    Ok(UserTask {
        key: row.get(0)?,
        author_id: row.get(1)?,
        label: row.get(2)?,
        frequency,
        scope,
        min_ilvl: row.get(5)?,
        max_ilvl: row.get(6)?,
        amount: row.get(7)?,
        icon_path: row.get(8)?,
        days_filter,
        shared: row.get(10)?,
        enabled: row.get(11)?,
        custom: row.get(12)?,
        version: row.get(13)?,
        index: catalog_index.map(|i| i as usize),
    })
}

fn load_task(conn: &Connection, key: &str) -> DomainResult<Option<UserTask>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE key = ?1", TASK_COLUMNS),
            params![key],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn key_exists(conn: &Connection, key: &str) -> DomainResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM tasks WHERE key = ?1", params![key], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Insert or overwrite; an existing row keeps its position
fn write_task(conn: &Connection, task: &UserTask) -> DomainResult<()> {
    let days_filter = serde_json::to_string(&task.days_filter)?;
    conn.execute(
        &format!(
            "INSERT INTO tasks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(key) DO UPDATE SET
                author_id = excluded.author_id,
                label = excluded.label,
                frequency = excluded.frequency,
                scope = excluded.scope,
                min_ilvl = excluded.min_ilvl,
                max_ilvl = excluded.max_ilvl,
                amount = excluded.amount,
                icon_path = excluded.icon_path,
                days_filter = excluded.days_filter,
                shared = excluded.shared,
                enabled = excluded.enabled,
                custom = excluded.custom,
                version = excluded.version,
                catalog_index = excluded.catalog_index",
            TASK_COLUMNS
        ),
        params![
            task.key,
            task.author_id,
            task.label,
            task.frequency.as_str(),
            task.scope.as_str(),
            task.min_ilvl,
            task.max_ilvl,
            task.amount,
            task.icon_path,
            days_filter,
            task.shared,
            task.enabled,
            task.custom,
            task.version,
            task.index.map(|i| i as i64),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Repository<UserTask> for TaskRepository {
    async fn find_by_id(&self, key: &str) -> DomainResult<Option<UserTask>> {
        let conn = self.conn.lock().await;
        load_task(&conn, key)
    }

    async fn query(&self, filter: &TaskFilter) -> DomainResult<Vec<UserTask>> {
        let conn = self.conn.lock().await;
        let tasks = match filter {
            TaskFilter::All => {
                let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks ORDER BY rowid", TASK_COLUMNS))?;
                let rows = stmt.query_map([], row_to_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            TaskFilter::Author(author) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM tasks WHERE author_id = ?1 ORDER BY rowid",
                    TASK_COLUMNS
                ))?;
                let rows = stmt.query_map(params![author], row_to_task)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(tasks)
    }

    async fn create(&self, entity: &UserTask) -> DomainResult<String> {
        let conn = self.conn.lock().await;
        let mut task = entity.clone();
        if task.key.is_empty() {
            task.set_key(self.generate_key());
        } else if key_exists(&conn, &task.key)? {
            return Err(DomainError::Conflict(format!("task {} already exists", task.key)));
        }
        write_task(&conn, &task)?;
        Ok(task.key)
    }

    async fn set(&self, entity: &UserTask) -> DomainResult<()> {
        if entity.key.is_empty() {
            return Err(DomainError::InvalidInput("task without a key".to_string()));
        }
        let conn = self.conn.lock().await;
        write_task(&conn, entity)
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM tasks WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch<UserTask>) -> DomainResult<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let count = batch.len();

        // Any error drops `tx`, which rolls the whole batch back
        for op in batch.into_ops() {
            match op {
                WriteOp::Set(task) => {
                    if task.key.is_empty() {
                        return Err(DomainError::InvalidInput(format!("task {} without a key", task.label)));
                    }
                    write_task(&tx, &task)?;
                }
                WriteOp::Update { key, patch } => {
                    let mut task = load_task(&tx, &key)?.ok_or_else(|| DomainError::NotFound(format!("task {}", key)))?;
                    task.apply(&patch);
                    write_task(&tx, &task)?;
                }
                WriteOp::Delete { key } => {
                    tx.execute("DELETE FROM tasks WHERE key = ?1", params![key])?;
                }
            }
        }

        tx.commit()?;
        Ok(count)
    }
}
