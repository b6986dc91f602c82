// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod bots;
pub mod knowledge;
pub mod tasks;
pub mod tenants;
pub mod turns;
