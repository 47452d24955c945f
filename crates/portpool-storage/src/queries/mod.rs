// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod countries;
pub mod locks;
pub mod messages;
pub mod numbers;
pub mod services;
