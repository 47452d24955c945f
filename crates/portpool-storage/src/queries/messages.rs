// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message persistence and lookup.

use chrono::{DateTime, Datelike, Utc};
use portpool_core::{Message, PortpoolError};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::database::{map_tr_err, parse_ts, ts, Database};

const COLUMNS: &str = "id, sender, receiver, port, text, received_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        port: row.get(3)?,
        text: row.get(4)?,
        received_at: parse_ts(row, 5)?,
    })
}

/// Insert a new message.
///
/// `received_at` must lie in years 0000-9999; anything else could not be
/// read back from its text column.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), PortpoolError> {
    if !(0..=9999).contains(&msg.received_at.year()) {
        return Err(PortpoolError::Parse {
            message: format!("received_at out of range: {}", msg.received_at),
        });
    }
    let msg = msg.clone();
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, sender, receiver, port, text, received_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    msg.id,
                    msg.sender,
                    msg.receiver,
                    msg.port,
                    msg.text,
                    ts(&msg.received_at),
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent messages first.
pub async fn list_messages(db: &Database, limit: i64) -> Result<Vec<Message>, PortpoolError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages ORDER BY received_at DESC, created_at DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map([limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages whose receiver equals one of `forms`, or whose text contains one.
///
/// `forms` are the dialed variants of a single number (bare, with dial code,
/// with `+` and dial code). Newest first.
pub async fn messages_for_number(
    db: &Database,
    forms: &[String],
    since: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<Message>, PortpoolError> {
    if forms.is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::with_capacity(forms.len() * 2);
    let mut args: Vec<Value> = Vec::with_capacity(forms.len() * 2 + 2);
    for form in forms {
        clauses.push("receiver = ?".to_string());
        args.push(Value::Text(form.clone()));
    }
    for form in forms {
        clauses.push("instr(text, ?) > 0".to_string());
        args.push(Value::Text(form.clone()));
    }

    let mut sql = format!("SELECT {COLUMNS} FROM messages WHERE ({})", clauses.join(" OR "));
    if let Some(since) = since {
        sql.push_str(" AND received_at >= ?");
        args.push(Value::Text(ts(&since)));
    }
    sql.push_str(" ORDER BY received_at DESC, created_at DESC LIMIT ?");
    args.push(Value::Integer(limit));

    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args), row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
