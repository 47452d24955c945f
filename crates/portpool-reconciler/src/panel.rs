// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for gateway panel status pages.

use std::time::Duration;

use portpool_core::{GatewayPanel, PanelEntry, PanelStatus, PortpoolError};
use tracing::debug;

/// Fetches `{"status": [...]}` payloads from gateway panels.
#[derive(Debug, Clone)]
pub struct PanelClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl PanelClient {
    /// Every fetch is bounded by `timeout`, connect included.
    pub fn new(timeout: Duration) -> Result<Self, PortpoolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortpoolError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// Fetch one panel's port entries.
    ///
    /// Timeouts, non-2xx statuses and malformed bodies are all
    /// [`PortpoolError::Panel`].
    pub async fn fetch(&self, panel: &GatewayPanel) -> Result<Vec<PanelEntry>, PortpoolError> {
        let fail = |message: String| PortpoolError::Panel {
            panel: panel.code.clone(),
            message,
        };

        let response = self.client.get(&panel.url).send().await.map_err(|e| {
            if e.is_timeout() {
                fail(format!("timed out after {:?}", self.timeout))
            } else {
                fail(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fail(format!("failed to read body: {e}")))?;
        let parsed: PanelStatus =
            serde_json::from_slice(&body).map_err(|e| fail(format!("malformed status JSON: {e}")))?;

        debug!(panel = %panel.code, entries = parsed.status.len(), "panel status fetched");
        Ok(parsed.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn panel(server: &MockServer) -> GatewayPanel {
        GatewayPanel {
            code: "P1".into(),
            url: format!("{}/status", server.uri()),
        }
    }

    #[tokio::test]
    async fn fetch_parses_entries_leniently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": [
                    {"inserted": 1, "sn": "919876543210", "port": "1.01", "sig": "18", "active": 1, "st": 3},
                    {"inserted": "0", "sn": ""}
                ]
            })))
            .mount(&server)
            .await;

        let client = PanelClient::new(Duration::from_secs(5)).unwrap();
        let entries = client.fetch(&panel(&server)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sig, Some(18));
        assert!(entries[0].is_valid());
        assert!(!entries[1].is_valid());
    }

    #[tokio::test]
    async fn non_success_status_is_a_panel_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = PanelClient::new(Duration::from_secs(5)).unwrap();
        let err = client.fetch(&panel(&server)).await.unwrap_err();
        assert!(matches!(err, PortpoolError::Panel { ref panel, .. } if panel == "P1"));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_panel_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = PanelClient::new(Duration::from_secs(5)).unwrap();
        let err = client.fetch(&panel(&server)).await.unwrap_err();
        assert!(err.to_string().contains("malformed status JSON"));
    }

    #[tokio::test]
    async fn slow_panel_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = PanelClient::new(Duration::from_millis(200)).unwrap();
        let err = client.fetch(&panel(&server)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }
}
