// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-period sweep scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::sweep::Reconciler;

/// Run sweeps every `period` until `cancel` fires.
///
/// The first sweep starts immediately. Each sweep runs inline, so a slow one
/// delays the next tick instead of overlapping it; ticks missed meanwhile are
/// dropped. Sweep errors are logged and never stop the loop. Returns the
/// number of sweeps that ran.
pub async fn run_scheduler(
    reconciler: Arc<Reconciler>,
    period: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sweeps = 0;

    info!(period_secs = period.as_secs(), "sweep scheduler running");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match reconciler.try_sweep().await {
                    Ok(Some(_)) => sweeps += 1,
                    Ok(None) => {}
                    Err(e) => error!(error = %e, "sweep failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!(sweeps, "sweep scheduler stopping");
                break;
            }
        }
    }
    sweeps
}
