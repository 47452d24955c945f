// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for portpool.
//!
//! Receives SMS webhooks from forwarders and GSM gateways, releases number
//! locks for the admin layer, looks up the latest code for a number, and
//! exposes the template generator.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{build_router, start_server, GatewayState};
