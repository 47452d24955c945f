// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for portpool.

use thiserror::Error;

/// The primary error type used across all portpool adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PortpoolError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Inbound payload could not be turned into a message.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Template compilation failed.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Generative text provider errors (API failure, empty completion).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A gateway panel could not be read.
    #[error("panel {panel}: {message}")]
    Panel { panel: String, message: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortpoolError {
    /// Shorthand for [`PortpoolError::NotFound`].
    pub fn not_found(entity: &str, key: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

/// Reasons a template string cannot be compiled into a matcher.
///
/// The `Display` text doubles as the feedback given to the template generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("No {{otp}} placeholder found in template")]
    MissingOtp,

    #[error(
        "Template contains multiple {{otp}} placeholders ({count}). Only one {{otp}} placeholder is allowed per template."
    )]
    MultipleOtp { count: usize },

    #[error("Failed to build matcher from template: {0}")]
    InvalidPattern(String),
}
