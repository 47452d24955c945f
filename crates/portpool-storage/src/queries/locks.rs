// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-service locks on numbers.
//!
//! A lock row records which service holds a number; `numbers.locked` is the
//! projection order assignment reads. Both are kept in step here.

use chrono::Utc;
use portpool_core::{Lock, PortpoolError};
use rusqlite::params;

use crate::database::{map_tr_err, parse_ts, ts, Database};

fn row_to_lock(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lock> {
    Ok(Lock {
        id: row.get(0)?,
        number_id: row.get(1)?,
        service_id: row.get(2)?,
        locked: row.get(3)?,
        created_at: parse_ts(row, 4)?,
        updated_at: parse_ts(row, 5)?,
    })
}

/// Lock `number_id` for `service_id`, re-locking an existing row if present.
pub async fn lock_number(
    db: &Database,
    number_id: i64,
    service_id: i64,
) -> Result<Lock, PortpoolError> {
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO locks (number_id, service_id, locked, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?3)
                 ON CONFLICT(number_id, service_id) DO UPDATE SET locked = 1, updated_at = ?3",
                params![number_id, service_id, now],
            )?;
            tx.execute(
                "UPDATE numbers SET locked = 1, updated_at = ?2 WHERE id = ?1",
                params![number_id, now],
            )?;
            let lock = tx.query_row(
                "SELECT id, number_id, service_id, locked, created_at, updated_at
                 FROM locks WHERE number_id = ?1 AND service_id = ?2",
                params![number_id, service_id],
                row_to_lock,
            )?;
            tx.commit()?;
            Ok(lock)
        })
        .await
        .map_err(map_tr_err)
}

/// Release `number_id` for every service. Returns whether it was locked.
pub async fn unlock_number(db: &Database, number_id: i64) -> Result<bool, PortpoolError> {
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let number_changed = tx.execute(
                "UPDATE numbers SET locked = 0, updated_at = ?2 WHERE id = ?1 AND locked != 0",
                params![number_id, now],
            )?;
            let locks_changed = tx.execute(
                "UPDATE locks SET locked = 0, updated_at = ?2 WHERE number_id = ?1 AND locked != 0",
                params![number_id, now],
            )?;
            tx.commit()?;
            Ok(number_changed + locks_changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Release every number currently locked for `service_id`.
///
/// `numbers.locked` is a per-number flag, so a number this service held is
/// cleared even when another service still has an active lock row on it.
/// Returns the number of lock rows released.
pub async fn unlock_service(db: &Database, service_id: i64) -> Result<usize, PortpoolError> {
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE numbers SET locked = 0, updated_at = ?2
                 WHERE locked != 0
                   AND id IN (SELECT number_id FROM locks WHERE service_id = ?1 AND locked != 0)",
                params![service_id, now],
            )?;
            let released = tx.execute(
                "UPDATE locks SET locked = 0, updated_at = ?2 WHERE service_id = ?1 AND locked != 0",
                params![service_id, now],
            )?;
            tx.commit()?;
            Ok(released)
        })
        .await
        .map_err(map_tr_err)
}

/// Lock rows, optionally for one service, oldest first.
pub async fn list_locks(db: &Database, service_id: Option<i64>) -> Result<Vec<Lock>, PortpoolError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, number_id, service_id, locked, created_at, updated_at
                 FROM locks WHERE ?1 IS NULL OR service_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![service_id], row_to_lock)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
