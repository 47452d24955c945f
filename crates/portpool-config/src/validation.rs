// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde attributes cannot express: address shape,
//! schedule bounds, dial codes, and panel uniqueness.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::PortpoolConfig;

/// Upper bound on generator rounds per request.
pub const MAX_GENERATOR_ATTEMPTS: u32 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PortpoolConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        fail("server.bind_address must not be empty".to_string());
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let reconciler = &config.reconciler;
    if reconciler.interval_secs < 1 {
        fail("reconciler.interval_secs must be at least 1".to_string());
    }
    if reconciler.fetch_timeout_secs < 1 {
        fail("reconciler.fetch_timeout_secs must be at least 1".to_string());
    }
    if reconciler.dial_code == 0 {
        fail("reconciler.dial_code must be greater than 0".to_string());
    }
    if reconciler.country.trim().is_empty() {
        fail("reconciler.country must not be empty".to_string());
    }

    let attempts = config.generator.max_attempts;
    if !(1..=MAX_GENERATOR_ATTEMPTS).contains(&attempts) {
        fail(format!(
            "generator.max_attempts must be between 1 and {MAX_GENERATOR_ATTEMPTS}, got {attempts}"
        ));
    }
    if config.generator.timeout_secs < 1 {
        fail("generator.timeout_secs must be at least 1".to_string());
    }

    if config.sms.dial_code == 0 {
        fail("sms.dial_code must be greater than 0".to_string());
    }
    let offset = config.sms.scts_utc_offset_minutes;
    if !(-720..=840).contains(&offset) {
        fail(format!(
            "sms.scts_utc_offset_minutes must be between -720 and 840, got {offset}"
        ));
    }

    let mut seen_codes = HashSet::new();
    for (i, panel) in config.panels.iter().enumerate() {
        let code = panel.code.trim();
        if code.is_empty() {
            fail(format!("panels[{i}].code must not be empty"));
        } else if !seen_codes.insert(code) {
            fail(format!("duplicate panel code `{code}` in [[panels]] array"));
        }

        // An empty URL is allowed: the panel is skipped with a warning.
        let url = panel.url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!(
                "panels[{i}].url `{url}` must start with http:// or https://"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
