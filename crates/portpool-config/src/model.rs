// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for portpool.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use portpool_core::GatewayPanel;
use serde::{Deserialize, Serialize};

/// Top-level portpool configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortpoolConfig {
    /// HTTP server and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gateway reconciliation schedule and country settings.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Gateway panels polled by the reconciler.
    #[serde(default)]
    pub panels: Vec<PanelConfig>,

    /// Generative template service settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Inbound SMS parsing settings.
    #[serde(default)]
    pub sms: SmsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address to bind the HTTP server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("portpool").join("portpool.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("portpool.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Gateway reconciler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Run the periodic sweep inside `serve`.
    #[serde(default = "default_reconciler_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-panel fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Country every reconciled number belongs to. Created on first sweep.
    #[serde(default = "default_country")]
    pub country: String,

    /// Dial code stripped from panel serial numbers.
    #[serde(default = "default_dial_code")]
    pub dial_code: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: default_reconciler_enabled(),
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            country: default_country(),
            dial_code: default_dial_code(),
        }
    }
}

fn default_reconciler_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    30
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_country() -> String {
    "india".to_string()
}

fn default_dial_code() -> u32 {
    91
}

/// One gateway panel entry (`[[panels]]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// Short panel identifier used in logs.
    pub code: String,

    /// Status endpoint returning `{"status": [...]}`.
    #[serde(default)]
    pub url: String,
}

impl From<&PanelConfig> for GatewayPanel {
    fn from(panel: &PanelConfig) -> Self {
        GatewayPanel {
            code: panel.code.clone(),
            url: panel.url.clone(),
        }
    }
}

/// Generative template service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable,
    /// and to the offline heuristic proposer when that is unset too.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat completions endpoint.
    #[serde(default = "default_generator_base_url")]
    pub base_url: String,

    /// Model used for template proposals.
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Hard ceiling on propose/validate rounds per request.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single completion call, in seconds.
    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_generator_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_generator_temperature")]
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generator_base_url(),
            model: default_generator_model(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_generator_timeout_secs(),
            max_tokens: default_generator_max_tokens(),
            temperature: default_generator_temperature(),
        }
    }
}

fn default_generator_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_generator_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_generator_timeout_secs() -> u64 {
    30
}

fn default_generator_max_tokens() -> u32 {
    1000
}

fn default_generator_temperature() -> f32 {
    0.1
}

/// Inbound SMS parsing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsConfig {
    /// Dial code stripped from receiver numbers.
    #[serde(default = "default_dial_code")]
    pub dial_code: u32,

    /// UTC offset, in minutes, of the carrier SCTS timestamps.
    #[serde(default)]
    pub scts_utc_offset_minutes: i32,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            dial_code: default_dial_code(),
            scts_utc_offset_minutes: 0,
        }
    }
}
