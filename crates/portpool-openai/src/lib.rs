// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat completion provider for portpool.
//!
//! Implements [`ProviderAdapter`] over the chat completions endpoint; the
//! template generator uses it to propose templates for sample messages.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use portpool_config::model::GeneratorConfig;
use portpool_core::error::PortpoolError;
use portpool_core::traits::{PluginAdapter, ProviderAdapter};
use portpool_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// Environment variable consulted when the config has no API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat completion provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    default_model: String,
}

impl OpenAiProvider {
    /// Creates a provider from the `[generator]` section.
    pub fn new(config: &GeneratorConfig) -> Result<Self, PortpoolError> {
        let api_key = resolve_api_key(&config.api_key).ok_or_else(|| {
            PortpoolError::Config(format!(
                "no generator API key: set generator.api_key or {API_KEY_ENV}"
            ))
        })?;
        let client = OpenAiClient::new(
            &api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, "completion provider initialized");

        Ok(Self {
            client,
            default_model: config.model.clone(),
        })
    }

    fn to_chat_request(&self, request: ProviderRequest) -> ChatRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };
        ChatRequest {
            model,
            messages: request
                .messages
                .into_iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: Some(m.content),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// The configured key if non-empty, else the environment variable.
pub fn resolve_api_key(configured: &Option<String>) -> Option<String> {
    configured
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PortpoolError> {
        // No API call: health checks must not spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PortpoolError> {
        debug!("completion provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PortpoolError> {
        let response = self.client.complete(&self.to_chat_request(request)).await?;
        debug!(
            id = %response.id,
            choices = response.choices.len(),
            "completion received"
        );
        Ok(ProviderResponse {
            content: response.first_text(),
            usage: TokenUsage {
                input_tokens: response.usage.prompt_tokens,
                output_tokens: response.usage.completion_tokens,
            },
            id: response.id,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portpool_core::ProviderMessage;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> GeneratorConfig {
        GeneratorConfig {
            api_key: Some("sk-test".into()),
            base_url,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn configured_key_wins() {
        assert_eq!(resolve_api_key(&Some("sk-a".into())).as_deref(), Some("sk-a"));
    }

    #[test]
    fn request_conversion_keeps_roles_and_falls_back_to_default_model() {
        let provider = OpenAiProvider::new(&config("http://localhost:1".into())).unwrap();
        let chat = provider.to_chat_request(ProviderRequest {
            model: String::new(),
            messages: vec![
                ProviderMessage {
                    role: "system".into(),
                    content: "rules".into(),
                },
                ProviderMessage {
                    role: "user".into(),
                    content: "sms".into(),
                },
            ],
            max_tokens: 50,
            temperature: 0.1,
        });
        assert_eq!(chat.model, "gpt-3.5-turbo");
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].content.as_deref(), Some("sms"));
        assert_eq!(chat.max_tokens, 50);
    }

    #[tokio::test]
    async fn complete_maps_first_choice_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "system", "content": "rules"}, {"role": "user", "content": "sms"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-9",
                "model": "gpt-3.5-turbo-0125",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "\"Your OTP is {otp}\""}}],
                "usage": {"prompt_tokens": 120, "completion_tokens": 8}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config(server.uri())).unwrap();
        let response = provider
            .complete(ProviderRequest {
                model: "gpt-3.5-turbo".into(),
                messages: vec![
                    ProviderMessage {
                        role: "system".into(),
                        content: "rules".into(),
                    },
                    ProviderMessage {
                        role: "user".into(),
                        content: "sms".into(),
                    },
                ],
                max_tokens: 1000,
                temperature: 0.1,
            })
            .await
            .unwrap();
        assert_eq!(response.content, "\"Your OTP is {otp}\"");
        assert_eq!(response.model, "gpt-3.5-turbo-0125");
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.usage.output_tokens, 8);
    }
}
