// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portpool serve` command implementation.
//!
//! Opens the registry, starts the sweep scheduler when enabled, and serves
//! the HTTP gateway until SIGINT/SIGTERM. Also holds the component builders
//! the other subcommands share.

use std::sync::Arc;
use std::time::Duration;

use portpool_config::model::{GeneratorConfig, PortpoolConfig};
use portpool_core::{PortpoolError, StorageAdapter};
use portpool_gateway::{start_server, GatewayState};
use portpool_openai::{resolve_api_key, OpenAiProvider};
use portpool_reconciler::{run_scheduler, Reconciler};
use portpool_sms::SmsParser;
use portpool_storage::SqliteStorage;
use portpool_template::TemplateGenerator;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::shutdown::install_signal_handler;

/// Runs the `portpool serve` command.
pub async fn run_serve(config: PortpoolConfig) -> Result<(), PortpoolError> {
    info!("starting portpool serve");

    let storage = open_storage(&config).await?;
    let parser = SmsParser::from_config(&config.sms)?;
    let generator = Arc::new(build_generator(&config.generator)?);

    let shutdown = CancellationToken::new();
    install_signal_handler(shutdown.clone());

    let scheduler = if config.reconciler.enabled {
        if config.panels.is_empty() {
            warn!("reconciler enabled but no [[panels]] configured");
        }
        let reconciler = Arc::new(Reconciler::new(
            storage.clone(),
            &config.reconciler,
            &config.panels,
        )?);
        Some(tokio::spawn(run_scheduler(
            reconciler,
            Duration::from_secs(config.reconciler.interval_secs),
            shutdown.clone(),
        )))
    } else {
        info!("reconciler disabled");
        None
    };

    let state = GatewayState::new(storage.clone(), parser, generator);
    let served = start_server(&config.server, state, shutdown.clone()).await;

    // The server also returns on bind failure; stop the schedule either way.
    shutdown.cancel();
    if let Some(handle) = scheduler {
        match handle.await {
            Ok(sweeps) => info!(sweeps, "scheduler stopped"),
            Err(e) => warn!(error = %e, "scheduler task failed"),
        }
    }

    let closed = storage.close().await;
    served?;
    closed?;
    info!("portpool stopped");
    Ok(())
}

/// Open and migrate the configured SQLite database.
pub async fn open_storage(config: &PortpoolConfig) -> Result<Arc<dyn StorageAdapter>, PortpoolError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// The completion-backed generator when an API key is available, else the
/// offline heuristic one.
pub fn build_generator(config: &GeneratorConfig) -> Result<TemplateGenerator, PortpoolError> {
    select_generator(config, resolve_api_key(&config.api_key))
}

fn select_generator(
    config: &GeneratorConfig,
    api_key: Option<String>,
) -> Result<TemplateGenerator, PortpoolError> {
    match api_key {
        Some(key) => {
            let provider = OpenAiProvider::new(&GeneratorConfig {
                api_key: Some(key),
                ..config.clone()
            })?;
            Ok(TemplateGenerator::with_provider(Arc::new(provider), config))
        }
        None => {
            warn!("no generator API key configured, using heuristic template proposer");
            Ok(TemplateGenerator::heuristic(Duration::from_secs(
                config.timeout_secs,
            )))
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so that
/// subcommands can print JSON on stdout.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portpool={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
