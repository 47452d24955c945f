// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use portpool_config::model::StorageConfig;
use portpool_core::{
    AdapterType, Country, HealthStatus, Lock, Message, NumberRecord, NumberUpdate, PluginAdapter,
    PortpoolError, Service, StorageAdapter, SweepOutcome,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PortpoolError> {
        self.db.get().ok_or_else(|| PortpoolError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), PortpoolError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PortpoolError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PortpoolError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PortpoolError> {
        let db = Database::open_with_options(&self.config.database_path, self.config.wal_mode)
            .await?;
        self.db.set(db).map_err(|_| PortpoolError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PortpoolError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), PortpoolError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn list_messages(&self, limit: i64) -> Result<Vec<Message>, PortpoolError> {
        queries::messages::list_messages(self.db()?, limit).await
    }

    async fn messages_for_number(
        &self,
        forms: &[String],
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, PortpoolError> {
        queries::messages::messages_for_number(self.db()?, forms, since, limit).await
    }

    // --- Number registry ---

    async fn apply_sweep(
        &self,
        country_id: i64,
        updates: &[NumberUpdate],
        at: DateTime<Utc>,
    ) -> Result<SweepOutcome, PortpoolError> {
        queries::numbers::apply_sweep(self.db()?, country_id, updates, at).await
    }

    async fn get_number(&self, id: i64) -> Result<Option<NumberRecord>, PortpoolError> {
        queries::numbers::get_number(self.db()?, id).await
    }

    async fn find_number(&self, number: i64) -> Result<Option<NumberRecord>, PortpoolError> {
        queries::numbers::find_number(self.db()?, number).await
    }

    async fn list_numbers(&self) -> Result<Vec<NumberRecord>, PortpoolError> {
        queries::numbers::list_numbers(self.db()?).await
    }

    // --- Locks ---

    async fn lock_number(&self, number_id: i64, service_id: i64) -> Result<Lock, PortpoolError> {
        queries::locks::lock_number(self.db()?, number_id, service_id).await
    }

    async fn unlock_number(&self, number_id: i64) -> Result<bool, PortpoolError> {
        queries::locks::unlock_number(self.db()?, number_id).await
    }

    async fn unlock_service(&self, service_id: i64) -> Result<usize, PortpoolError> {
        queries::locks::unlock_service(self.db()?, service_id).await
    }

    async fn list_locks(&self, service_id: Option<i64>) -> Result<Vec<Lock>, PortpoolError> {
        queries::locks::list_locks(self.db()?, service_id).await
    }

    // --- Catalog ---

    async fn ensure_country(&self, name: &str, dial_code: u32) -> Result<Country, PortpoolError> {
        queries::countries::ensure_country(self.db()?, name, dial_code).await
    }

    async fn create_service(
        &self,
        name: &str,
        templates: &[String],
    ) -> Result<Service, PortpoolError> {
        queries::services::create_service(self.db()?, name, templates).await
    }

    async fn get_service_by_name(&self, name: &str) -> Result<Option<Service>, PortpoolError> {
        queries::services::get_service_by_name(self.db()?, name).await
    }
}
