// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release side of number locking.
//!
//! Locks are taken by order assignment through [`StorageAdapter::lock_number`];
//! this manager only releases them.

use std::sync::Arc;

use portpool_core::{PortpoolError, StorageAdapter};
use tracing::info;

/// Releases per-service number locks.
#[derive(Clone)]
pub struct LockManager {
    storage: Arc<dyn StorageAdapter>,
}

impl LockManager {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Unlock one number.
    ///
    /// Returns how many numbers changed state: 1, or 0 when it was already
    /// unlocked. An unknown id is `NotFound`.
    pub async fn unlock(&self, number_id: i64) -> Result<usize, PortpoolError> {
        if self.storage.get_number(number_id).await?.is_none() {
            return Err(PortpoolError::not_found("number", number_id));
        }
        let changed = self.storage.unlock_number(number_id).await?;
        if changed {
            info!(number_id, "number unlocked");
        }
        Ok(usize::from(changed))
    }

    /// Unlock every number locked for the named service.
    ///
    /// `NotFound` when the service does not exist or nothing was locked.
    pub async fn unlock_all(&self, service_name: &str) -> Result<usize, PortpoolError> {
        let service = self
            .storage
            .get_service_by_name(service_name)
            .await?
            .ok_or_else(|| PortpoolError::not_found("service", service_name))?;

        let count = self.storage.unlock_service(service.id).await?;
        if count == 0 {
            return Err(PortpoolError::not_found(
                "locked numbers for service",
                service_name,
            ));
        }
        info!(service = %service.name, count, "service numbers unlocked");
        Ok(count)
    }
}
