// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use itinera_core::ItineraError;

use crate::migrations::run_migrations;

/// Convert tokio_rusqlite errors into `ItineraError::StoreUnavailable`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ItineraError {
    ItineraError::StoreUnavailable {
        source: Box::new(e),
    }
}

/// A single SQLite connection with migrations applied.
///
/// The `Database` struct IS the single writer: all callers go through
/// `connection().call()`, and tokio-rusqlite serializes every closure on
/// one background thread, eliminating SQLITE_BUSY under concurrent access.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, ItineraError> {
        Self::open_with(path, true).await
    }

    /// Open with explicit WAL mode control.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, ItineraError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ItineraError::StoreUnavailable {
                    source: Box::new(e),
                })?;
            }
        }
        let conn = Connection::open(path.to_owned())
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        let db = Self::configure(conn, wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open an in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, ItineraError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        Self::configure(conn, false).await
    }

    async fn configure(conn: Connection, wal_mode: bool) -> Result<Self, ItineraError> {
        conn.call(
            move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                run_migrations(conn)?;
                Ok(())
            },
        )
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(source) => ItineraError::StoreUnavailable { source },
            tokio_rusqlite::Error::Close(c) => map_tr_err(tokio_rusqlite::Error::Close(c)),
            other => ItineraError::StoreUnavailable {
                source: other.to_string().into(),
            },
        })?;
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the connection cleanly.
    pub async fn close(&self) -> Result<(), ItineraError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
