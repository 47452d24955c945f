// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use portpool_core::{dialed_forms, normalize, Message, PortpoolError};
use portpool_template::{GenerationFailure, GenerationOutcome, TemplateSet};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Messages scanned per OTP lookup, newest first.
pub const OTP_LOOKUP_LIMIT: i64 = 50;

const SUPPORT_CONTACT: &str =
    "For immediate assistance, please contact support with the exact SMS text.";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    fn ok() -> Self {
        Self { status: "ok" }
    }
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockAllRequest {
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub message: String,
    pub unlocked_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub sms_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub template: String,
    pub extracted_otp: String,
    pub attempts: u32,
    pub success: bool,
}

/// Body returned when the generator gives up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailedResponse {
    pub error: String,
    pub details: String,
    pub category: String,
    pub assistant_explanation: String,
    pub support_contact: &'static str,
}

impl From<&GenerationFailure> for GenerationFailedResponse {
    fn from(failure: &GenerationFailure) -> Self {
        Self {
            error: format!(
                "Failed to generate valid template after {} attempts",
                failure.attempts
            ),
            details: failure.last_reason.to_string(),
            category: failure.category().to_string(),
            assistant_explanation: failure.explanation(),
            support_contact: SUPPORT_CONTACT,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OtpQuery {
    #[serde(default)]
    pub service: Option<String>,
    /// Ignore messages received before this instant.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    pub number: String,
    pub service: String,
    pub otp: String,
    pub message_id: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /v1/sms/structured
///
/// JSON payload from an Android forwarder.
pub async fn post_sms_structured(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let message = state
        .parser
        .parse_structured(&body, Utc::now())
        .map_err(|e| {
            warn!(error = %e, "structured sms rejected");
            ApiError::from(PortpoolError::from(e))
        })?;
    store_message(&state, &message).await?;
    Ok(Json(StatusResponse::ok()))
}

/// POST /v1/sms/raw
///
/// Labeled-line dump from a GSM gateway, any content type.
pub async fn post_sms_raw(
    State(state): State<GatewayState>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let text = String::from_utf8_lossy(&body);
    let message = state.parser.parse_raw(&text, Utc::now()).map_err(|e| {
        warn!(error = %e, "raw sms rejected");
        ApiError::bad_request("Parse error")
    })?;
    store_message(&state, &message).await?;
    Ok(Json(StatusResponse::ok()))
}

async fn store_message(state: &GatewayState, message: &Message) -> Result<(), ApiError> {
    state.storage.insert_message(message).await?;
    info!(
        id = %message.id,
        port = %message.port,
        sender = %message.sender,
        receiver = %message.receiver,
        "sms stored"
    );
    Ok(())
}

/// POST /v1/locks/unlock
pub async fn post_unlock(
    State(state): State<GatewayState>,
    payload: Result<Json<UnlockRequest>, JsonRejection>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let Json(body) = payload?;
    let id = body
        .id
        .ok_or_else(|| ApiError::bad_request("Number id is required"))?;

    let unlocked_count = state.locks.unlock(id).await?;
    let message = if unlocked_count == 0 {
        format!("Number {id} was already unlocked")
    } else {
        format!("Successfully unlocked number {id}")
    };
    Ok(Json(UnlockResponse {
        message,
        unlocked_count,
    }))
}

/// POST /v1/locks/unlock-all
pub async fn post_unlock_all(
    State(state): State<GatewayState>,
    payload: Result<Json<UnlockAllRequest>, JsonRejection>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let Json(body) = payload?;
    let service = body
        .service
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Service name is required"))?;

    let unlocked_count = state.locks.unlock_all(&service).await?;
    Ok(Json(UnlockResponse {
        message: format!("Successfully unlocked {unlocked_count} locks for service: {service}"),
        unlocked_count,
    }))
}

/// POST /v1/templates/generate
///
/// Runs the propose/validate loop on a sample SMS. Exhaustion is a 400 with
/// a remediation hint; a provider failure outside the loop is a 500.
pub async fn post_generate_template(
    State(state): State<GatewayState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let sms = body
        .sms_text
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("SMS text is required"))?;

    match state.generator.generate(&sms).await? {
        GenerationOutcome::Accepted(generated) => Ok(Json(GenerateResponse {
            template: generated.template,
            extracted_otp: generated.otp,
            attempts: generated.attempts,
            success: true,
        })
        .into_response()),
        GenerationOutcome::Exhausted(failure) => Ok((
            StatusCode::BAD_REQUEST,
            Json(GenerationFailedResponse::from(&failure)),
        )
            .into_response()),
    }
}

/// GET /v1/numbers/{number}/otp?service=NAME
///
/// The newest code the service's templates extract from messages sent to
/// `number` in any of its dialed forms.
pub async fn get_number_otp(
    State(state): State<GatewayState>,
    Path(number): Path<String>,
    query: Result<Query<OtpQuery>, QueryRejection>,
) -> Result<Json<OtpResponse>, ApiError> {
    let Query(query) = query?;
    let canonical = normalize(&number, state.dial_code);
    if canonical.is_unknown() {
        return Err(ApiError::bad_request(format!("invalid number: {number}")));
    }
    let service_name = query
        .service
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Service name is required"))?;

    let service = state
        .storage
        .get_service_by_name(&service_name)
        .await?
        .ok_or_else(|| PortpoolError::not_found("service", &service_name))?;
    let templates = TemplateSet::compile(&service.templates).map_err(PortpoolError::from)?;

    let forms = dialed_forms(&canonical, state.dial_code);
    let messages = state
        .storage
        .messages_for_number(&forms, query.since, OTP_LOOKUP_LIMIT)
        .await?;

    let found = messages
        .into_iter()
        .find_map(|m| templates.extract(&m.text).map(|hit| (m, hit)));
    let Some((message, hit)) = found else {
        return Err(PortpoolError::not_found("OTP for number", canonical.as_str()).into());
    };

    info!(
        number = %canonical,
        service = %service.name,
        template_index = hit.template_index,
        "otp extracted"
    );
    Ok(Json(OtpResponse {
        number: canonical.into_string(),
        service: service.name,
        otp: hit.otp,
        message_id: message.id,
        sender: message.sender,
        received_at: message.received_at,
    }))
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
