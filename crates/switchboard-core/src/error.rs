// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for routing, registry, and queue operations.
//!
//! Every invariant violation is detected and rejected before any write, so
//! callers never observe partially-applied state alongside an error.

use thiserror::Error;

use crate::types::AgentId;

/// Why an operation conflicted with current state.
///
/// The distinct variants matter to callers: a capacity rejection and a
/// lost assignment race warrant different dashboard messages, so each
/// carries a stable machine-readable [`code`](ConflictReason::code).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    /// The agent already holds `max_conversations` conversations.
    #[error("agent {agent_id} is at capacity ({max_conversations})")]
    AtCapacity {
        agent_id: AgentId,
        max_conversations: i64,
    },

    /// The conversation is already claimed by a different agent.
    #[error("conversation already assigned to {assigned_to}")]
    AlreadyAssigned { assigned_to: AgentId },

    /// The requesting agent is not the conversation's assignee.
    #[error("conversation is assigned to {assigned_to}")]
    NotAssignee { assigned_to: AgentId },

    /// The conversation is closed; closed is terminal.
    #[error("conversation is closed")]
    ConversationClosed,

    /// Feedback fields may be written at most once per message.
    #[error("feedback already recorded for this message")]
    FeedbackAlreadyRecorded,

    /// Lowering the ceiling below the live count would break the
    /// capacity invariant.
    #[error("max_conversations {requested} is below current load {current}")]
    MaxBelowCurrent { requested: i64, current: i64 },
}

impl ConflictReason {
    /// Stable code surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AtCapacity { .. } => "at_capacity",
            Self::AlreadyAssigned { .. } => "already_assigned",
            Self::NotAssignee { .. } => "not_assignee",
            Self::ConversationClosed => "conversation_closed",
            Self::FeedbackAlreadyRecorded => "feedback_already_recorded",
            Self::MaxBelowCurrent { .. } => "max_below_current",
        }
    }
}

/// The primary error type for all Switchboard operations.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation lost to current state (capacity, ownership,
    /// terminal status, duplicate feedback).
    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    /// The transition is not legal from the conversation's current
    /// status, or a parameter is out of range.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Propagated from the external authorization layer; never
    /// generated by the engine itself.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Storage backend failure (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Broken internal invariant. Indicates a bug, not caller error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchboardError {
    /// Stable code surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict(reason) => reason.code(),
            Self::InvalidState(_) => "invalid_state",
            Self::Unauthorized(_) => "unauthorized",
            Self::Storage { .. } => "storage",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the dashboard should treat the failure as retryable after
    /// refreshing its view of the conversation.
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict(
                ConflictReason::AtCapacity { .. }
                    | ConflictReason::AlreadyAssigned { .. }
                    | ConflictReason::NotAssignee { .. }
            )
        )
    }
}

impl From<ConflictReason> for SwitchboardError {
    fn from(reason: ConflictReason) -> Self {
        Self::Conflict(reason)
    }
}
