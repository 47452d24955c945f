// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One reconciliation sweep across every configured panel.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use portpool_config::model::{PanelConfig, ReconcilerConfig};
use portpool_core::{GatewayPanel, PanelEntry, PortpoolError, StorageAdapter, SweepOutcome};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::panel::PanelClient;
use crate::plan::plan_sweep;

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub panels_ok: usize,
    pub panels_failed: usize,
    /// Distinct numbers written.
    pub numbers: usize,
    pub outcome: SweepOutcome,
    /// True when no panel yielded a valid entry and nothing was written.
    pub skipped_empty: bool,
}

/// Polls gateway panels and merges their state into the number registry.
pub struct Reconciler {
    storage: Arc<dyn StorageAdapter>,
    client: PanelClient,
    panels: Vec<GatewayPanel>,
    country: String,
    dial_code: u32,
    running: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        config: &ReconcilerConfig,
        panels: &[PanelConfig],
    ) -> Result<Self, PortpoolError> {
        Ok(Self {
            storage,
            client: PanelClient::new(Duration::from_secs(config.fetch_timeout_secs))?,
            panels: panels.iter().map(GatewayPanel::from).collect(),
            country: config.country.clone(),
            dial_code: config.dial_code,
            running: Mutex::new(()),
        })
    }

    pub fn panels(&self) -> &[GatewayPanel] {
        &self.panels
    }

    /// Run a sweep unless one is already in progress.
    ///
    /// Returns `Ok(None)` when skipped because another sweep holds the guard.
    pub async fn try_sweep(&self) -> Result<Option<SweepReport>, PortpoolError> {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("sweep already running, skipping");
            return Ok(None);
        };
        self.run().await.map(Some)
    }

    async fn run(&self) -> Result<SweepReport, PortpoolError> {
        let fetched = join_all(self.panels.iter().map(|panel| self.fetch_panel(panel))).await;

        let mut report = SweepReport::default();
        let mut contributions: Vec<Vec<PanelEntry>> = Vec::with_capacity(fetched.len());
        for result in fetched {
            match result {
                Some(entries) => {
                    report.panels_ok += 1;
                    contributions.push(entries);
                }
                None => {
                    report.panels_failed += 1;
                    contributions.push(Vec::new());
                }
            }
        }

        let updates = plan_sweep(contributions.iter().map(Vec::as_slice), self.dial_code);
        if updates.is_empty() {
            warn!(
                panels = self.panels.len(),
                failed = report.panels_failed,
                "no valid panel entries, registry left untouched"
            );
            report.skipped_empty = true;
            return Ok(report);
        }

        let country = self
            .storage
            .ensure_country(&self.country, self.dial_code)
            .await?;
        report.numbers = updates.len();
        report.outcome = self
            .storage
            .apply_sweep(country.id, &updates, Utc::now())
            .await?;

        info!(
            upserted = report.numbers,
            inserted = report.outcome.inserted,
            deactivated = report.outcome.deactivated,
            panels_failed = report.panels_failed,
            "sweep complete"
        );
        Ok(report)
    }

    /// A panel's entries, or `None` when it could not be read.
    async fn fetch_panel(&self, panel: &GatewayPanel) -> Option<Vec<PanelEntry>> {
        if panel.url.trim().is_empty() {
            warn!(panel = %panel.code, "panel has no URL, skipping");
            return Some(Vec::new());
        }
        match self.client.fetch(panel).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(panel = %panel.code, error = %e, "panel fetch failed");
                None
            }
        }
    }
}
