// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portpool sync`: one reconciliation sweep, then exit.

use portpool_config::model::PortpoolConfig;
use portpool_core::PortpoolError;
use portpool_reconciler::{Reconciler, SweepReport};
use tracing::warn;

use crate::serve::open_storage;

pub async fn run_sync(config: &PortpoolConfig) -> Result<SweepReport, PortpoolError> {
    if config.panels.is_empty() {
        warn!("no [[panels]] configured, nothing to sweep");
    }
    let storage = open_storage(config).await?;
    let reconciler = Reconciler::new(storage.clone(), &config.reconciler, &config.panels)?;
    let report = reconciler
        .try_sweep()
        .await?
        .ok_or_else(|| PortpoolError::Internal("sweep already running".to_string()))?;
    storage.close().await?;
    Ok(report)
}
