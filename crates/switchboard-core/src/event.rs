// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event types broadcast on the bus after successful mutations.
//!
//! Each event is an immutable fact about one committed state change. The
//! payload is a tagged union keyed by `type`, one strongly-typed struct
//! per variant. Events are never persisted; they live only for the
//! duration of in-flight delivery and there is no replay log.

use serde::{Deserialize, Serialize};

use crate::time;
use crate::types::{
    AgentId, AgentStatus, ChatbotId, ConversationId, ConversationStatus, Message,
    OrganizationId,
};

/// A conversation was claimed by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAssigned {
    pub organization_id: OrganizationId,
    pub chatbot_id: ChatbotId,
    pub conversation_id: ConversationId,
    pub agent_id: AgentId,
}

/// An agent's availability or load changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusChanged {
    pub organization_id: OrganizationId,
    pub agent_id: AgentId,
    pub status: AgentStatus,
    pub current_conversations: i64,
    pub max_conversations: i64,
}

/// A conversation moved to a new lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStatusChanged {
    pub organization_id: OrganizationId,
    pub chatbot_id: ChatbotId,
    pub conversation_id: ConversationId,
    pub status: ConversationStatus,
    pub assigned_to: Option<AgentId>,
}

/// A message was appended to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePosted {
    pub organization_id: OrganizationId,
    pub chatbot_id: ChatbotId,
    pub conversation_id: ConversationId,
    pub message: Message,
}

/// Payload tagged union. Serializes as `{"type": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventPayload {
    #[serde(rename = "agent.assigned")]
    AgentAssigned(AgentAssigned),
    #[serde(rename = "agent.status")]
    AgentStatus(AgentStatusChanged),
    #[serde(rename = "conversation.status")]
    ConversationStatus(ConversationStatusChanged),
    #[serde(rename = "conversation.message")]
    ConversationMessage(MessagePosted),
}

impl EventPayload {
    /// The wire `type` string for this payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentAssigned(_) => "agent.assigned",
            Self::AgentStatus(_) => "agent.status",
            Self::ConversationStatus(_) => "conversation.status",
            Self::ConversationMessage(_) => "conversation.message",
        }
    }

    /// Every payload carries the organization needed for routing.
    pub fn organization_id(&self) -> &OrganizationId {
        match self {
            Self::AgentAssigned(p) => &p.organization_id,
            Self::AgentStatus(p) => &p.organization_id,
            Self::ConversationStatus(p) => &p.organization_id,
            Self::ConversationMessage(p) => &p.organization_id,
        }
    }

    /// Conversation scope, when the event concerns one conversation.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        match self {
            Self::AgentAssigned(p) => Some(&p.conversation_id),
            Self::AgentStatus(_) => None,
            Self::ConversationStatus(p) => Some(&p.conversation_id),
            Self::ConversationMessage(p) => Some(&p.conversation_id),
        }
    }

    /// Chatbot scope, when the event concerns one conversation.
    pub fn chatbot_id(&self) -> Option<&ChatbotId> {
        match self {
            Self::AgentAssigned(p) => Some(&p.chatbot_id),
            Self::AgentStatus(_) => None,
            Self::ConversationStatus(p) => Some(&p.chatbot_id),
            Self::ConversationMessage(p) => Some(&p.chatbot_id),
        }
    }
}

/// An event as delivered to subscribers and pushed over the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub payload: EventPayload,
    pub emitted_at: String,
}

impl Event {
    /// Stamp a payload with the current time.
    pub fn now(payload: EventPayload) -> Self {
        Self {
            payload,
            emitted_at: time::now_rfc3339(),
        }
    }
}
