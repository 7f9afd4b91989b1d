//! Document Repository
//!
//! Stores whole per-user records (roster, completion book, settings) as
//! JSON bodies in the `documents` table, one collection per record type.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::{CompletionBook, DomainError, DomainResult, Entity, Roster, UserSettings};
use super::batch::{WriteBatch, WriteOp};
use super::traits::Repository;

/// A record stored as one JSON document
pub trait Document: Entity + Serialize + DeserializeOwned {
    const COLLECTION: &'static str;
}

impl Document for Roster {
    const COLLECTION: &'static str = "rosters";
}

impl Document for CompletionBook {
    const COLLECTION: &'static str = "completion";
}

impl Document for UserSettings {
    const COLLECTION: &'static str = "settings";
}

pub struct DocumentRepository<T: Document> {
    conn: Arc<Mutex<Connection>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> DocumentRepository<T> {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            _marker: PhantomData,
        }
    }
}

fn decode<T: Document>(key: String, body: &str) -> DomainResult<T> {
    let mut doc: T = serde_json::from_str(body)?;
    doc.set_key(key);
    Ok(doc)
}

fn load<T: Document>(conn: &Connection, key: &str) -> DomainResult<Option<T>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
            params![T::COLLECTION, key],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|b| decode(key.to_string(), &b)).transpose()
}

fn store<T: Document>(conn: &Connection, doc: &T) -> DomainResult<()> {
    let body = serde_json::to_string(doc)?;
    conn.execute(
        "INSERT INTO documents (collection, key, body) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, key) DO UPDATE SET body = excluded.body",
        params![T::COLLECTION, doc.key(), body],
    )?;
    Ok(())
}

fn remove<T: Document>(conn: &Connection, key: &str) -> DomainResult<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
        params![T::COLLECTION, key],
    )?;
    Ok(())
}

#[async_trait]
impl<T: Document> Repository<T> for DocumentRepository<T> {
    async fn find_by_id(&self, key: &str) -> DomainResult<Option<T>> {
        let conn = self.conn.lock().await;
        load(&conn, key)
    }

    async fn query(&self, filter: &T::Filter) -> DomainResult<Vec<T>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT key, body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![T::COLLECTION], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (key, body) = row?;
            let doc: T = decode(key, &body)?;
            if doc.matches(filter) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn create(&self, entity: &T) -> DomainResult<String> {
        let conn = self.conn.lock().await;
        let mut doc = entity.clone();
        if doc.key().is_empty() {
            doc.set_key(self.generate_key());
        } else if load::<T>(&conn, doc.key())?.is_some() {
            return Err(DomainError::Conflict(format!("{} {} already exists", T::COLLECTION, doc.key())));
        }
        store(&conn, &doc)?;
        Ok(doc.key().to_string())
    }

    async fn set(&self, entity: &T) -> DomainResult<()> {
        if entity.key().is_empty() {
            return Err(DomainError::InvalidInput(format!("{} document without a key", T::COLLECTION)));
        }
        let conn = self.conn.lock().await;
        store(&conn, entity)
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        remove::<T>(&conn, key)
    }

    async fn commit(&self, batch: WriteBatch<T>) -> DomainResult<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let count = batch.len();

        for op in batch.into_ops() {
            match op {
                WriteOp::Set(doc) => {
                    if doc.key().is_empty() {
                        return Err(DomainError::InvalidInput(format!("{} document without a key", T::COLLECTION)));
                    }
                    store(&tx, &doc)?;
                }
                WriteOp::Update { key, patch } => {
                    let mut doc: T = load(&tx, &key)?
                        .ok_or_else(|| DomainError::NotFound(format!("{} {}", T::COLLECTION, key)))?;
                    doc.apply(&patch);
                    store(&tx, &doc)?;
                }
                WriteOp::Delete { key } => remove::<T>(&tx, &key)?,
            }
        }

        tx.commit()?;
        Ok(count)
    }
}
