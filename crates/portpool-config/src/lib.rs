// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! portpool configuration: the `[server]`, `[storage]`, `[reconciler]`,
//! `[[panels]]`, `[generator]` and `[sms]` tables, layered from compiled
//! defaults, TOML files and `PORTPOOL_*` variables.
//!
//! Every entry point returns either a validated [`PortpoolConfig`] or all
//! problems found, as [`ConfigError`] diagnostics for [`render_errors`].

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PortpoolConfig;

/// Load from the standard file locations plus environment.
pub fn load_and_validate() -> Result<PortpoolConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || read_sources(loader::search_paths()))
}

/// Load from `path` plus environment, as `portpool --config <path>` does.
pub fn load_and_validate_path(path: &Path) -> Result<PortpoolConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources(vec![path.to_path_buf()])
    })
}

/// Load from an in-memory TOML document only.
pub fn load_and_validate_str(toml_content: &str) -> Result<PortpoolConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a parsed config, or turn the figment error into diagnostics.
///
/// File contents are only read back when there is an error to point at.
fn finish(
    parsed: Result<PortpoolConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<PortpoolConfig, Vec<ConfigError>> {
    let config = parsed.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_sources(paths: Vec<PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
