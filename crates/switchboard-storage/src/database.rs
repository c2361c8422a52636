// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread, and SQLite transactions are serializable, which is what makes
//! the conditional-update compare-and-swap in `queries::handoff` race-free
//! even across processes sharing the database file. Do NOT create
//! additional Connection instances for writes.

use switchboard_core::SwitchboardError;
use tracing::info;

/// Handle to the single SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, configure
    /// pragmas, and run pending migrations.
    pub async fn open(path: &str) -> Result<Self, SwitchboardError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        let migration_result = conn
            .call(|conn| {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migration_result?;

        info!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection. Query modules call
    /// through this; nothing else should.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush and close the connection.
    pub async fn close(self) -> Result<(), SwitchboardError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into the shared storage error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> SwitchboardError {
    SwitchboardError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_runs_migrations_and_is_reopenable() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();

        // Schema exists.
        let tables: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type = 'table' AND name IN
                       ('chatbots', 'agents', 'conversations', 'messages', 'agent_availability')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 5);
        db.close().await.unwrap();

        // Reopening applies no migration twice.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }
}
