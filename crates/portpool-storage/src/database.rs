// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use chrono::{DateTime, SecondsFormat, Utc};
use portpool_core::PortpoolError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the portpool SQLite database.
///
/// Wraps a single `tokio_rusqlite::Connection`. Every query module takes
/// `&Database` and goes through [`Database::connection`], so writes from the
/// webhooks and the reconciler are serialized on one thread.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, PortpoolError> {
        Self::open_with_options(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with_options(path: &str, wal_mode: bool) -> Result<Self, PortpoolError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PortpoolError::Storage {
                source: Box::new(e),
            })?;
        }

        // Migrations need a plain rusqlite connection; run them on the
        // blocking pool before the long-lived writer connection is opened.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), PortpoolError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(|e| {
                PortpoolError::Storage {
                    source: Box::new(e),
                }
            })?;
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.pragma_update(None, "journal_mode", journal)
                .map_err(|e| PortpoolError::Storage {
                    source: Box::new(e),
                })?;
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| PortpoolError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PortpoolError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), PortpoolError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into PortpoolError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PortpoolError {
    PortpoolError::Storage {
        source: Box::new(e),
    }
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically.
pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read an RFC 3339 text column back into a UTC timestamp.
pub(crate) fn parse_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
