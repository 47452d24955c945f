// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw carrier dumps: labeled lines followed by the message body.
//!
//! ```text
//! Sender: VM-HDFC
//! Receiver: "8" 919876543210
//! SCTS: 240315123000
//! Your OTP is 4521
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use portpool_core::{normalize, single_line, Message, UNKNOWN};
use tracing::warn;

use crate::error::ParseError;
use crate::scts;

const SENDER: &str = "Sender:";
const RECEIVER: &str = "Receiver:";
const SCTS: &str = "SCTS:";

/// Every label whose line is metadata rather than message text.
const LABELS: [&str; 5] = [SENDER, RECEIVER, SCTS, "SMSC:", "Slot:"];

/// Value after `label` on the first line that starts with it.
fn label_value<'a>(lines: &[&'a str], label: &str) -> Option<&'a str> {
    lines
        .iter()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
}

/// Split a receiver line into `(port, remainder)`.
///
/// The port is the first non-empty double-quoted token; it and the
/// whitespace after it are removed from the remainder.
fn split_receiver(line: &str) -> (Option<&str>, String) {
    let Some(open) = line.find('"') else {
        return (None, line.to_string());
    };
    let after_open = &line[open + 1..];
    let Some(len) = after_open.find('"') else {
        return (None, line.to_string());
    };
    let port = &after_open[..len];
    if port.is_empty() {
        return (None, line.to_string());
    }
    let rest = after_open[len + 1..].trim_start();
    (Some(port), format!("{}{}", &line[..open], rest))
}

pub(crate) fn parse(
    body: &str,
    dial_code: u32,
    scts_offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<Message, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::EmptyBody);
    }

    let lines: Vec<&str> = body.lines().map(str::trim).collect();

    let sender = label_value(&lines, SENDER)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string();

    let (port, receiver) = match label_value(&lines, RECEIVER) {
        Some(line) => {
            let (port, rest) = split_receiver(line);
            (port.map(str::to_string), normalize(&rest, dial_code))
        }
        None => (None, normalize("", dial_code)),
    };

    let received_at = match label_value(&lines, SCTS).filter(|v| !v.is_empty()) {
        Some(code) => scts::decode(code, scts_offset).unwrap_or_else(|| {
            warn!(scts = code, "undecodable SCTS, using ingestion time");
            now
        }),
        None => now,
    };

    let text = lines
        .iter()
        .filter(|line| !line.is_empty() && !LABELS.iter().any(|label| line.starts_with(label)))
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Message {
        id: uuid::Uuid::new_v4().to_string(),
        sender,
        receiver: receiver.into_string(),
        port: port.unwrap_or_else(|| UNKNOWN.to_string()),
        text: single_line(&text),
        received_at,
    })
}
