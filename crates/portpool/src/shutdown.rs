// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SIGINT/SIGTERM handling for `portpool serve`.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancel `token` on the first SIGINT or SIGTERM.
///
/// The scheduler and the HTTP server both watch the token, so one signal
/// stops the schedule and drains in-flight requests.
pub fn install_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                info!(signal, "shutdown requested");
                token.cancel();
            }
            // Cancelled from elsewhere, e.g. the server failed to bind.
            _ = token.cancelled() => {}
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}
