// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use portpool_config::model::ServerConfig;
use portpool_core::{PortpoolError, StorageAdapter};
use portpool_sms::SmsParser;
use portpool_storage::LockManager;
use portpool_template::TemplateGenerator;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub storage: Arc<dyn StorageAdapter>,
    pub parser: SmsParser,
    pub locks: LockManager,
    pub generator: Arc<TemplateGenerator>,
    /// Dial code used to canonicalize numbers in lookup paths.
    pub dial_code: u32,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        parser: SmsParser,
        generator: Arc<TemplateGenerator>,
    ) -> Self {
        Self {
            locks: LockManager::new(storage.clone()),
            dial_code: parser.dial_code(),
            storage,
            parser,
            generator,
            start_time: Instant::now(),
        }
    }
}

/// All gateway routes with tracing and CORS layers applied.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/sms/structured", post(handlers::post_sms_structured))
        .route("/v1/sms/raw", post(handlers::post_sms_raw))
        .route("/v1/locks/unlock", post(handlers::post_unlock))
        .route("/v1/locks/unlock-all", post(handlers::post_unlock_all))
        .route("/v1/templates/generate", post(handlers::post_generate_template))
        .route("/v1/numbers/{number}/otp", get(handlers::get_number_otp))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Bind `bind_address:port` and serve until `shutdown` is cancelled.
///
/// In-flight requests are drained before returning.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), PortpoolError> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PortpoolError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PortpoolError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
