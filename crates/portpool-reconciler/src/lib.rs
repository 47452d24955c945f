// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway reconciliation for portpool.
//!
//! Panels are fetched concurrently, their entries merged into one update per
//! canonical number, and the result written to the registry in a single
//! transaction that also deactivates every number the sweep did not report.

pub mod panel;
pub mod plan;
pub mod scheduler;
pub mod sweep;

pub use panel::PanelClient;
pub use plan::{entry_to_update, plan_sweep};
pub use scheduler::run_scheduler;
pub use sweep::{Reconciler, SweepReport};
