// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Country catalog.

use chrono::Utc;
use portpool_core::{Country, PortpoolError};
use rusqlite::params;

use crate::database::{map_tr_err, ts, Database};

/// Return the country named `name`, creating it with `dial_code` if missing.
///
/// An existing country keeps its stored dial code.
pub async fn ensure_country(
    db: &Database,
    name: &str,
    dial_code: u32,
) -> Result<Country, PortpoolError> {
    let name = name.to_string();
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO countries (name, dial_code, created_at) VALUES (?1, ?2, ?3)",
                params![name, dial_code, now],
            )?;
            conn.query_row(
                "SELECT id, name, dial_code FROM countries WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Country {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        dial_code: row.get(2)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}
