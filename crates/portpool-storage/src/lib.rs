// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for portpool.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for the
//! message store, the number registry, locks, and the service catalog.

pub mod adapter;
pub mod database;
pub mod lock_manager;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use lock_manager::LockManager;
