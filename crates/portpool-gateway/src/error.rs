// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`PortpoolError`] onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portpool_core::PortpoolError;
use serde::Serialize;
use tracing::error;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A handler failure: parse errors are 400, missing entities 404,
/// everything else 500.
#[derive(Debug)]
pub struct ApiError(pub PortpoolError);

impl ApiError {
    /// A 400 with `message` as the body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(PortpoolError::Parse {
            message: message.into(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PortpoolError::Parse { .. } => StatusCode::BAD_REQUEST,
            PortpoolError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortpoolError> for ApiError {
    fn from(e: PortpoolError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            PortpoolError::Parse { message } => message.clone(),
            PortpoolError::NotFound { .. } => self.0.to_string(),
            other => {
                // Internal detail stays in the log.
                error!(error = %other, "request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
