// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard live-chat routing engine.
//!
//! This crate provides the domain types, the event tagged union, and the
//! error taxonomy shared by the storage, engine, bus, and gateway crates.

pub mod error;
pub mod event;
pub mod time;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ConflictReason, SwitchboardError};
pub use event::{Event, EventPayload};
pub use types::{
    AgentId, AgentStatus, ChatbotId, ConversationId, ConversationStatus, MessageId,
    MessageRole, OrganizationId, SessionId,
};
