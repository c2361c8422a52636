// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Switchboard routing engine.
//!
//! Provides WAL-mode SQLite with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query modules. The
//! multi-statement handoff operations in [`queries::handoff`] and
//! [`queries::messages`] each run inside one SQLite transaction, so an
//! operation either commits whole or leaves no trace.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
