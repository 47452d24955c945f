// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Number registry: sweep upserts and lookups.

use chrono::{DateTime, Utc};
use portpool_core::{NumberRecord, NumberUpdate, PortpoolError, SweepOutcome};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, parse_ts, ts, Database};

const COLUMNS: &str =
    "id, number, country_id, port, iccid, imsi, operator, signal, active, locked, last_rotation";

pub(crate) fn row_to_number(row: &rusqlite::Row<'_>) -> rusqlite::Result<NumberRecord> {
    Ok(NumberRecord {
        id: row.get(0)?,
        number: row.get(1)?,
        country_id: row.get(2)?,
        port: row.get(3)?,
        iccid: row.get(4)?,
        imsi: row.get(5)?,
        operator: row.get(6)?,
        signal: row.get(7)?,
        active: row.get(8)?,
        locked: row.get(9)?,
        last_rotation: parse_ts(row, 10)?,
    })
}

/// Apply one reconciliation sweep atomically.
///
/// Every update is upserted on `number`, then every number missing from
/// `updates` is set to `active = 0, signal = 0`. Locked state of absent
/// numbers is left as is. Inactive rows always get `signal = 0`, whatever
/// the update carries.
pub async fn apply_sweep(
    db: &Database,
    country_id: i64,
    updates: &[NumberUpdate],
    at: DateTime<Utc>,
) -> Result<SweepOutcome, PortpoolError> {
    let updates = updates.to_vec();
    let at = ts(&at);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut outcome = SweepOutcome::default();

            tx.execute_batch(
                "CREATE TEMP TABLE IF NOT EXISTS sweep_numbers (number INTEGER PRIMARY KEY);
                 DELETE FROM sweep_numbers;",
            )?;

            {
                let mut exists = tx.prepare("SELECT 1 FROM numbers WHERE number = ?1")?;
                let mut upsert = tx.prepare(
                    "INSERT INTO numbers (number, country_id, port, iccid, imsi, operator,
                                          signal, active, locked, last_rotation, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                             CASE WHEN ?8 THEN ?7 ELSE 0 END, ?8, ?9, ?10, ?10)
                     ON CONFLICT(number) DO UPDATE SET
                         country_id = excluded.country_id,
                         port = excluded.port,
                         iccid = excluded.iccid,
                         imsi = excluded.imsi,
                         operator = excluded.operator,
                         signal = excluded.signal,
                         active = excluded.active,
                         locked = excluded.locked,
                         last_rotation = excluded.last_rotation,
                         updated_at = excluded.updated_at",
                )?;
                let mut mark = tx.prepare("INSERT OR IGNORE INTO sweep_numbers (number) VALUES (?1)")?;

                for u in &updates {
                    let existed = exists
                        .query_row(params![u.number], |_| Ok(()))
                        .optional()?
                        .is_some();
                    upsert.execute(params![
                        u.number,
                        country_id,
                        u.port,
                        u.iccid,
                        u.imsi,
                        u.operator,
                        u.signal.max(0),
                        u.active,
                        u.locked,
                        at,
                    ])?;
                    mark.execute(params![u.number])?;
                    if existed {
                        outcome.updated += 1;
                    } else {
                        outcome.inserted += 1;
                    }
                }
            }

            outcome.deactivated = tx.execute(
                "UPDATE numbers SET active = 0, signal = 0, updated_at = ?1
                 WHERE number NOT IN (SELECT number FROM sweep_numbers)
                   AND (active != 0 OR signal != 0)",
                params![at],
            )?;

            tx.execute("DELETE FROM sweep_numbers", [])?;
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a number by row id.
pub async fn get_number(db: &Database, id: i64) -> Result<Option<NumberRecord>, PortpoolError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM numbers WHERE id = ?1"),
                params![id],
                row_to_number,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a number by its canonical value.
pub async fn find_number(db: &Database, number: i64) -> Result<Option<NumberRecord>, PortpoolError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM numbers WHERE number = ?1"),
                params![number],
                row_to_number,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All numbers ordered by canonical value.
pub async fn list_numbers(db: &Database) -> Result<Vec<NumberRecord>, PortpoolError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM numbers ORDER BY number"))?;
            let rows = stmt.query_map([], row_to_number)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
