// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat completions API.
//!
//! Provides [`OpenAiClient`] which handles bearer authentication, request
//! timeouts, and retry of transient errors.

use std::time::Duration;

use portpool_core::PortpoolError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for chat completion calls.
///
/// Retries once on transient errors (429, 500, 503, 529).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// Creates a client posting to `base_url` with a per-request `timeout`.
    pub fn new(api_key: &str, base_url: String, timeout: Duration) -> Result<Self, PortpoolError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                PortpoolError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PortpoolError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the pause between retries.
    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a completion request and returns the parsed response.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, PortpoolError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| self.transport_error(e))?;
                return serde_json::from_str(&body).map_err(|e| PortpoolError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PortpoolError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "completion API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(PortpoolError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| PortpoolError::Provider {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }

    fn transport_error(&self, e: reqwest::Error) -> PortpoolError {
        if e.is_timeout() {
            PortpoolError::Timeout {
                duration: self.timeout,
            }
        } else {
            PortpoolError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: Some("Hello".into()),
            }],
            max_tokens: 1000,
            temperature: 0.1,
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        })
    }

    #[tokio::test]
    async fn complete_success_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo", "max_tokens": 1000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Code {otp}")))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server).complete(&test_request()).await.unwrap();
        assert_eq!(response.id, "chatcmpl-1");
        assert_eq!(response.first_text(), "Code {otp}");
        assert_eq!(response.usage.prompt_tokens, 12);
    }

    #[tokio::test]
    async fn retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"type": "rate_limit_error", "message": "slow down"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("after retry")))
            .mount(&server)
            .await;

        let response = test_client(&server).complete(&test_request()).await.unwrap();
        assert_eq!(response.first_text(), "after retry");
    }

    #[tokio::test]
    async fn exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"type": "server_error", "message": "overloaded"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .complete(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("server_error"), "got: {err}");
    }

    #[tokio::test]
    async fn fails_fast_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "Incorrect API key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .complete(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Incorrect API key"), "got: {err}");
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(
            "sk-test",
            server.uri(),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(matches!(err, PortpoolError::Timeout { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server).complete(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse API response"));
    }
}
