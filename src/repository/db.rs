//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, MAX_ILVL};

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Storage(format!("serialization: {}", e))
    }
}

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Connection>>,
}

impl DbState {
    /// Shared handle for repositories
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

/// Open (or create) the database at `db_path` and run migrations.
///
/// `:memory:` opens a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = if db_path.as_os_str() == ":memory:" {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Storage(format!("{}: {}", parent.display(), e)))?;
        }
        Connection::open(db_path)?
    };

    run_migrations(&conn)?;
    log::debug!("database ready at {}", db_path.display());

    Ok(DbState {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS tasks (
                key TEXT PRIMARY KEY,
                author_id TEXT NOT NULL,
                label TEXT NOT NULL,
                frequency TEXT NOT NULL DEFAULT 'daily',
                scope TEXT NOT NULL DEFAULT 'character',
                min_ilvl INTEGER NOT NULL DEFAULT 0,
                max_ilvl INTEGER NOT NULL DEFAULT {},
                amount INTEGER NOT NULL DEFAULT 1,
                icon_path TEXT,
                enabled INTEGER NOT NULL DEFAULT 1,
                custom INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 0,
                catalog_index INTEGER
            )",
            MAX_ILVL
        ),
        [],
    )?;

    // Columns added after the first release
    if !column_exists(conn, "tasks", "days_filter")? {
        conn.execute("ALTER TABLE tasks ADD COLUMN days_filter TEXT NOT NULL DEFAULT '[]'", [])?;
    }

    if !column_exists(conn, "tasks", "shared")? {
        conn.execute("ALTER TABLE tasks ADD COLUMN shared INTEGER NOT NULL DEFAULT 0", [])?;
    }

    conn.execute("CREATE INDEX IF NOT EXISTS idx_tasks_author ON tasks(author_id)", [])?;

    // Per-user JSON documents: rosters, completion books, settings
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            key TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, key)
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let state = init_db(Path::new(":memory:")).await.unwrap();
        let conn = state.connection();
        let conn = conn.lock().await;

        run_migrations(&conn).unwrap();
        assert!(column_exists(&conn, "tasks", "days_filter").unwrap());
        assert!(column_exists(&conn, "tasks", "shared").unwrap());
        assert!(!column_exists(&conn, "tasks", "nope").unwrap());
    }

    #[tokio::test]
    async fn test_legacy_table_gets_new_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE tasks (key TEXT PRIMARY KEY, author_id TEXT NOT NULL, label TEXT NOT NULL,
             frequency TEXT NOT NULL, scope TEXT NOT NULL, min_ilvl INTEGER NOT NULL, max_ilvl INTEGER NOT NULL,
             amount INTEGER NOT NULL, icon_path TEXT, enabled INTEGER NOT NULL, custom INTEGER NOT NULL,
             version INTEGER NOT NULL, catalog_index INTEGER)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tasks VALUES ('k', 'alice', 'Argos', 'weekly', 'character', 1370, 9999, 1, NULL, 1, 0, 1, 5)",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let (days, shared): (String, bool) = conn
            .query_row("SELECT days_filter, shared FROM tasks WHERE key = 'k'", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(days, "[]");
        assert!(!shared);
    }
}
