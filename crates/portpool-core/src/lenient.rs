// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forgiving serde helpers for device-generated JSON.
//!
//! Gateway panels and Android forwarders disagree on whether numeric fields
//! are JSON numbers or strings. These helpers accept either and degrade
//! anything else to `None` instead of failing the whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional string that may arrive as a string or a number.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_to_string(&v)))
}

/// Deserialize an optional integer that may arrive as a number or a numeric string.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_to_i64(&v)))
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
