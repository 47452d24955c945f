// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` assembles temp SQLite storage, the SMS parser, the lock
//! manager and a [`MockProvider`], plus helpers for seeding the registry.

use std::sync::Arc;

use chrono::Utc;
use portpool_config::model::{PortpoolConfig, StorageConfig};
use portpool_core::{
    Country, Lock, NumberRecord, NumberUpdate, PortpoolError, Service, StorageAdapter,
};
use portpool_sms::SmsParser;
use portpool_storage::{LockManager, SqliteStorage};

use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: PortpoolConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: PortpoolConfig::default(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Start from a custom configuration. The storage section is replaced
    /// with a temp database.
    pub fn with_config(mut self, config: PortpoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, PortpoolError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PortpoolError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let parser = SmsParser::from_config(&config.sms)?;
        let locks = LockManager::new(storage.clone());
        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));

        Ok(TestHarness {
            mock_provider,
            storage,
            parser,
            locks,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    /// The mock completion provider.
    pub mock_provider: Arc<MockProvider>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub parser: SmsParser,
    pub locks: LockManager,
    pub config: PortpoolConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The configured reconciler country, created if missing.
    pub async fn country(&self) -> Result<Country, PortpoolError> {
        self.storage
            .ensure_country(&self.config.reconciler.country, self.config.reconciler.dial_code)
            .await
    }

    /// Register active numbers on sequential ports, as one sweep would.
    pub async fn seed_numbers(&self, numbers: &[i64]) -> Result<Vec<NumberRecord>, PortpoolError> {
        let country = self.country().await?;
        let updates: Vec<NumberUpdate> = numbers
            .iter()
            .enumerate()
            .map(|(i, &number)| NumberUpdate {
                number,
                port: format!("{}.01", i + 1),
                iccid: None,
                imsi: None,
                operator: Some("Jio".to_string()),
                signal: 20,
                active: true,
                locked: false,
            })
            .collect();
        self.storage
            .apply_sweep(country.id, &updates, Utc::now())
            .await?;

        let mut records = Vec::with_capacity(numbers.len());
        for &number in numbers {
            let record = self
                .storage
                .find_number(number)
                .await?
                .ok_or_else(|| PortpoolError::not_found("number", number))?;
            records.push(record);
        }
        Ok(records)
    }

    pub async fn seed_service(
        &self,
        name: &str,
        templates: &[&str],
    ) -> Result<Service, PortpoolError> {
        let templates: Vec<String> = templates.iter().map(|t| t.to_string()).collect();
        self.storage.create_service(name, &templates).await
    }

    /// Lock `number_id` for `service_id`, the way order assignment does.
    pub async fn lock(&self, number_id: i64, service_id: i64) -> Result<Lock, PortpoolError> {
        self.storage.lock_number(number_id, service_id).await
    }

    /// Add a response to the mock provider's queue.
    pub async fn add_provider_response(&self, text: String) {
        self.mock_provider.add_response(text).await;
    }
}
