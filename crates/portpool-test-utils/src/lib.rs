// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for portpool integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted completion provider that records requests
//! - [`TestHarness`] - Temp SQLite storage wired to the parser and lock manager

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
