// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Switchboard routing engine.
//!
//! Exposes the routing, registry, and queue operations as a JSON REST
//! API plus the server-push event stream. Identity arrives from the
//! upstream authenticated dashboard layer as headers; the gateway checks
//! the transport bearer token and otherwise trusts it.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{GatewayState, ServerConfig, start_server};
