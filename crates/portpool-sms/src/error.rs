// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use portpool_core::PortpoolError;
use thiserror::Error;

/// Why an inbound payload could not become a [`Message`](portpool_core::Message).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request body")]
    EmptyBody,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("payload must be a JSON object")]
    NotAnObject,
}

impl From<ParseError> for PortpoolError {
    fn from(e: ParseError) -> Self {
        PortpoolError::Parse {
            message: e.to_string(),
        }
    }
}
