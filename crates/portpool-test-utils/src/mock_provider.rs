// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! so template generation can be tested without calling a real API.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use portpool_core::traits::adapter::PluginAdapter;
use portpool_core::traits::provider::ProviderAdapter;
use portpool_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use portpool_core::PortpoolError;

/// One scripted reply.
enum Reply {
    Text(String),
    Failure(String),
}

/// A mock provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty, an empty
/// completion is returned. Every request is recorded for later inspection.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(responses.into_iter().map(Reply::Text).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.replies.lock().await.push_back(Reply::Text(text));
    }

    /// Queue a provider error.
    pub async fn add_failure(&self, message: String) {
        self.replies.lock().await.push_back(Reply::Failure(message));
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PortpoolError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PortpoolError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PortpoolError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let content = match self.replies.lock().await.pop_front() {
            Some(Reply::Text(text)) => text,
            Some(Reply::Failure(message)) => {
                return Err(PortpoolError::Provider {
                    message,
                    source: None,
                });
            }
            None => String::new(),
        };

        Ok(ProviderResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content,
            model,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}
