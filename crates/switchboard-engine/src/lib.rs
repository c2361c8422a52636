// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing engine, agent registry, and queue manager.
//!
//! This crate owns every event emission: each public operation runs one
//! storage transaction and, on success, publishes the corresponding
//! events on the injected bus. Reads (`get_conversation`, `get_agents`,
//! `list_queue`) publish nothing.

pub mod queue;
pub mod registry;
pub mod routing;

pub use queue::QueueManager;
pub use registry::AgentRegistry;
pub use routing::{HandoffRequest, RoutingEngine};
