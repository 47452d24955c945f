// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across portpool crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

// --- Messages ---

/// An inbound SMS in canonical form.
///
/// Created once by the payload parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    /// Canonical receiver number, or `Unknown`.
    pub receiver: String,
    /// SIM slot / port identifier, or `Unknown`.
    pub port: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

// --- Number registry ---

/// A phone number in the rental pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRecord {
    pub id: i64,
    /// Canonical 10-digit subscriber number, globally unique.
    pub number: i64,
    pub country_id: Option<i64>,
    pub port: String,
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub operator: Option<String>,
    /// Always 0 when `active` is false.
    pub signal: i64,
    pub active: bool,
    pub locked: bool,
    pub last_rotation: DateTime<Utc>,
}

/// The state of one number as reported by a reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberUpdate {
    pub number: i64,
    pub port: String,
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub operator: Option<String>,
    pub signal: i64,
    pub active: bool,
    pub locked: bool,
}

/// Write counts from applying one sweep to the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub deactivated: usize,
}

// --- Locks ---

/// A per-service reservation on a number, written by order assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lock {
    pub id: i64,
    pub number_id: i64,
    pub service_id: i64,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Catalog ---

/// A third-party service whose verification SMS we extract codes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    /// Placeholder templates, tried in order.
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub dial_code: u32,
}

/// An external gateway panel polled by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPanel {
    pub code: String,
    pub url: String,
}

/// One port entry from a gateway panel's status payload.
///
/// Panels send numbers and strings interchangeably, so every field is read
/// leniently and missing or malformed values become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEntry {
    #[serde(default, deserialize_with = "crate::lenient::opt_i64")]
    pub inserted: Option<i64>,
    /// Serial number, i.e. the raw phone number of the SIM.
    #[serde(default, deserialize_with = "crate::lenient::opt_string")]
    pub sn: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_string")]
    pub port: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_string")]
    pub iccid: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_string")]
    pub imsi: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_string")]
    pub opr: Option<String>,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64")]
    pub sig: Option<i64>,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64")]
    pub active: Option<i64>,
    #[serde(default, deserialize_with = "crate::lenient::opt_i64")]
    pub st: Option<i64>,
}

impl PanelEntry {
    /// Status codes a panel reports for a port that is registered and usable.
    pub const ACTIVE_STATUSES: [i64; 2] = [3, 7];

    /// Whether the entry describes an inserted SIM with a serial number.
    pub fn is_valid(&self) -> bool {
        self.inserted == Some(1) && self.sn.as_deref().is_some_and(|sn| !sn.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.st.is_some_and(|st| Self::ACTIVE_STATUSES.contains(&st))
    }

    /// A port whose `active` flag is 0 is held by the panel and treated as locked.
    pub fn is_locked(&self) -> bool {
        self.active == Some(0)
    }
}

/// The `{"status": [...]}` envelope returned by a gateway panel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelStatus {
    #[serde(default)]
    pub status: Vec<PanelEntry>,
}

// --- Provider types ---

/// A single chat turn sent to a generative text provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// A completion request to a generative text provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completion returned by a generative text provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    /// Text of the first choice.
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}
