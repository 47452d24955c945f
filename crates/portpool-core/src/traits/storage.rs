// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PortpoolError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Country, Lock, Message, NumberRecord, NumberUpdate, Service, SweepOutcome};

/// Adapter for storage and persistence backends.
///
/// Covers the message store, the number registry, per-service locks, and the
/// small catalog (countries, services) the core reads from.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PortpoolError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PortpoolError>;

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), PortpoolError>;

    /// Most recent messages first.
    async fn list_messages(&self, limit: i64) -> Result<Vec<Message>, PortpoolError>;

    /// Messages addressed to, or mentioning, any of the given number forms,
    /// most recent first, optionally bounded below by `since`.
    async fn messages_for_number(
        &self,
        forms: &[String],
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, PortpoolError>;

    // --- Number registry ---

    /// Upserts every update keyed on the canonical number and marks all other
    /// numbers inactive, as one atomic write.
    async fn apply_sweep(
        &self,
        country_id: i64,
        updates: &[NumberUpdate],
        at: DateTime<Utc>,
    ) -> Result<SweepOutcome, PortpoolError>;

    async fn get_number(&self, id: i64) -> Result<Option<NumberRecord>, PortpoolError>;

    async fn find_number(&self, number: i64) -> Result<Option<NumberRecord>, PortpoolError>;

    async fn list_numbers(&self) -> Result<Vec<NumberRecord>, PortpoolError>;

    // --- Locks ---

    /// Reserves a number for a service. Driven by order assignment.
    async fn lock_number(&self, number_id: i64, service_id: i64) -> Result<Lock, PortpoolError>;

    /// Releases a number. Returns whether anything was locked before.
    async fn unlock_number(&self, number_id: i64) -> Result<bool, PortpoolError>;

    /// Releases every active lock held for a service. Returns the count released.
    async fn unlock_service(&self, service_id: i64) -> Result<usize, PortpoolError>;

    async fn list_locks(&self, service_id: Option<i64>) -> Result<Vec<Lock>, PortpoolError>;

    // --- Catalog ---

    /// Returns the country with this name, creating it if missing.
    async fn ensure_country(&self, name: &str, dial_code: u32) -> Result<Country, PortpoolError>;

    async fn create_service(&self, name: &str, templates: &[String]) -> Result<Service, PortpoolError>;

    async fn get_service_by_name(&self, name: &str) -> Result<Option<Service>, PortpoolError>;
}
