// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for portpool.
//!
//! This crate provides the foundational trait definitions, error types,
//! number normalization, and domain types used throughout the workspace.

pub mod error;
pub mod lenient;
pub mod normalize;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{PortpoolError, TemplateError};
pub use normalize::{dialed_forms, normalize, single_line, CanonicalNumber, UNKNOWN};
pub use types::{
    AdapterType, Country, GatewayPanel, HealthStatus, Lock, Message, NumberRecord, NumberUpdate,
    PanelEntry, PanelStatus, ProviderMessage, ProviderRequest, ProviderResponse, Service,
    SweepOutcome, TokenUsage,
};

pub use traits::{PluginAdapter, ProviderAdapter, StorageAdapter};
