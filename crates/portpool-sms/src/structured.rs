// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON payloads posted by Android SMS forwarders.

use chrono::{DateTime, Datelike, Utc};
use portpool_core::lenient::{opt_i64, opt_string, value_to_string};
use portpool_core::{normalize, Message, UNKNOWN};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ParseError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredPayload {
    #[serde(default, deserialize_with = "opt_string")]
    sender: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    recipient: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    message: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    received_at: Option<Value>,
    #[serde(default, deserialize_with = "opt_i64")]
    slot_index: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    carrier_name: Option<String>,
    #[serde(default)]
    slot_info: Option<Value>,
}

/// Parse a time field: epoch milliseconds (number or numeric string) or RFC 3339.
///
/// Instants outside years 0000-9999 have no RFC 3339 rendering and are
/// treated as unparseable.
fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    let at = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(_) => s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis),
            }
        }
        _ => None,
    };
    at.filter(|dt| (0..=9999).contains(&dt.year()))
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Sender IDs are either phone numbers or alphanumeric headers like `VM-HDFC`.
fn is_phone_shaped(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'))
}

pub(crate) fn parse(body: &[u8], dial_code: u32, now: DateTime<Utc>) -> Result<Message, ParseError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::EmptyBody);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let payload: StructuredPayload =
        serde_json::from_value(value).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let sender = match payload.sender {
        Some(s) if is_phone_shaped(&s) => normalize(&s, dial_code).into_string(),
        Some(s) => s,
        None => UNKNOWN.to_string(),
    };

    let receiver = normalize(payload.recipient.as_deref().unwrap_or_default(), dial_code);

    let port = payload
        .slot_info
        .as_ref()
        .and_then(|info| info.get("phoneNumber"))
        .and_then(value_to_string)
        .map(|phone| normalize(&phone, dial_code).into_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let mut received_at = None;
    for (field, candidate) in [
        ("receivedAt", payload.received_at.as_ref()),
        ("timestamp", payload.timestamp.as_ref()),
    ] {
        let Some(candidate) = candidate.filter(|v| !is_absent(v)) else {
            continue;
        };
        match parse_time(candidate) {
            Some(at) => {
                received_at = Some(at);
                break;
            }
            None => warn!(field, value = %candidate, "unparseable time field ignored"),
        }
    }

    debug!(
        slot_index = ?payload.slot_index,
        carrier = payload.carrier_name.as_deref().unwrap_or(UNKNOWN),
        "structured payload decoded"
    );

    Ok(Message {
        id: uuid::Uuid::new_v4().to_string(),
        sender,
        receiver: receiver.into_string(),
        port,
        text: payload.message.unwrap_or_default(),
        received_at: received_at.unwrap_or(now),
    })
}
