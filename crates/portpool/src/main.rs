// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! portpool - SIM-pool SMS ingestion and OTP extraction.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod sync;
mod template;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use portpool_config::{ConfigError, PortpoolConfig};
use portpool_template::GenerationOutcome;

/// portpool - SIM-pool SMS ingestion and OTP extraction.
#[derive(Parser, Debug)]
#[command(name = "portpool", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP gateway and run the sweep scheduler.
    Serve,
    /// Run one reconciliation sweep and exit.
    Sync,
    /// Generate a template for a sample SMS.
    Template {
        /// The sample message text.
        sms: String,
    },
    /// Validate and print the effective configuration.
    Config,
}

fn load_config(path: Option<&Path>) -> Result<PortpoolConfig, Vec<ConfigError>> {
    match path {
        Some(path) => portpool_config::load_and_validate_path(path),
        None => portpool_config::load_and_validate(),
    }
}

/// The configuration as TOML, with the API key masked.
fn render_config(config: &PortpoolConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.generator.api_key.is_some() {
        shown.generator.api_key = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&shown)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            portpool_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("portpool: use --help for available commands");
        return;
    };

    if !matches!(command, Commands::Config) {
        serve::init_tracing(&config.server.log_level);
    }

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Sync => sync::run_sync(&config).await.map(|report| {
            println!("{}", serde_json::json!(report));
        }),
        Commands::Template { sms } => match template::run_template(&config, &sms).await {
            Ok(outcome) => {
                println!("{:#}", template::render_outcome(&outcome));
                if matches!(outcome, GenerationOutcome::Exhausted(_)) {
                    std::process::exit(2);
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Config => match render_config(&config) {
            Ok(text) => {
                println!("{text}");
                Ok(())
            }
            Err(e) => Err(portpool_core::PortpoolError::Internal(format!(
                "failed to render config: {e}"
            ))),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn template_subcommand_takes_sms() {
        let cli = Cli::try_parse_from(["portpool", "template", "Your OTP is 4521"]).unwrap();
        match cli.command {
            Some(Commands::Template { sms }) => assert_eq!(sms, "Your OTP is 4521"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["portpool", "sync", "--config", "/tmp/pp.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/pp.toml")));
    }

    #[test]
    fn rendered_config_masks_api_key() {
        let mut config = PortpoolConfig::default();
        config.generator.api_key = Some("sk-secret".to_string());
        let text = render_config(&config).unwrap();
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("[redacted]"));
        assert!(text.contains("[server]"));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = portpool_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.server.port, 3000);
        assert!(config.reconciler.enabled);
    }
}
