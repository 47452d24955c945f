// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./portpool.toml` > `~/.config/portpool/portpool.toml` > `/etc/portpool/portpool.toml`
//! with environment variable overrides via `PORTPOOL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PortpoolConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/portpool/portpool.toml` (system-wide)
/// 3. `~/.config/portpool/portpool.toml` (user XDG config)
/// 4. `./portpool.toml` (local directory)
/// 5. `PORTPOOL_*` environment variables
pub fn load_config() -> Result<PortpoolConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PortpoolConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortpoolConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PortpoolConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortpoolConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order, lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/portpool/portpool.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("portpool/portpool.toml"));
    }
    paths.push(PathBuf::from("portpool.toml"));
    paths
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(PortpoolConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// keys survive: `PORTPOOL_RECONCILER_INTERVAL_SECS` maps to
/// `reconciler.interval_secs`, not `reconciler.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("PORTPOOL_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["server", "storage", "reconciler", "generator", "sms"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("reconciler_interval_secs"),
            "reconciler.interval_secs"
        );
        assert_eq!(map_env_key("generator_api_key"), "generator.api_key");
        assert_eq!(
            map_env_key("sms_scts_utc_offset_minutes"),
            "sms.scts_utc_offset_minutes"
        );
        assert_eq!(map_env_key("unknown_thing"), "unknown_thing");
    }

    #[test]
    fn local_file_is_searched_last() {
        let paths = search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/portpool/portpool.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("portpool.toml")));
    }
}
