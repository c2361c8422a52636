// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Switchboard workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// Identifier of an end-user chat session, stable across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Unique identifier for a human agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Unique identifier for an organization (tenant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

/// Unique identifier for a chatbot. Chatbots belong to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatbotId(pub String);

impl ConversationId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl MessageId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ChatbotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a conversation.
///
/// `waiting_for_human -> handed_off` happens only through assignment;
/// `closed` is terminal and reachable from every other state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    WaitingForHuman,
    HandedOff,
    Closed,
}

/// Availability state of a human agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Away,
    Offline,
}

/// Author role of a message on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One end-user chat session moving between the bot and human agents.
///
/// Invariant: `assigned_to` is non-null iff `status == HandedOff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub session_id: SessionId,
    pub chatbot_id: ChatbotId,
    /// Owning organization, resolved through the chatbot.
    pub organization_id: OrganizationId,
    pub status: ConversationStatus,
    pub assigned_to: Option<AgentId>,
    /// Higher is more urgent. Defaults to 0.
    pub priority: i64,
    /// Free-form routing/classification hints.
    pub tags: Vec<String>,
    /// Milliseconds from creation to the first agent-authored message.
    /// Set exactly once; immutable thereafter.
    pub first_response_time_ms: Option<i64>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub closed_at: Option<String>,
}

/// A single message in a conversation. Append-only; only the feedback
/// fields may be written after creation, and at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub is_from_agent: bool,
    pub agent_id: Option<AgentId>,
    /// Visible to agents only, never to the end user.
    pub internal_note: Option<String>,
    pub feedback_rating: Option<i64>,
    pub feedback_comment: Option<String>,
    pub created_at: String,
}

/// A chatbot record, read for organization scoping. The surrounding
/// dashboard CRUD layer owns creation and the rest of its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chatbot {
    pub id: ChatbotId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub created_at: String,
}

/// An agent's identity record, read for display joins. Owned by the
/// surrounding dashboard CRUD layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub organization_id: OrganizationId,
    pub display_name: String,
    pub created_at: String,
}

/// Availability and capacity of one agent within one organization.
///
/// Invariant: `0 <= current_conversations <= max_conversations` after
/// every successful operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAvailability {
    pub agent_id: AgentId,
    pub organization_id: OrganizationId,
    pub status: AgentStatus,
    pub max_conversations: i64,
    pub current_conversations: i64,
    pub updated_at: String,
}

/// Default ceiling for agents that never configured one.
pub const DEFAULT_MAX_CONVERSATIONS: i64 = 3;

/// An agent's identity joined with availability, as returned by the
/// registry. Agents without an availability row report offline defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOverview {
    pub agent_id: AgentId,
    pub display_name: String,
    pub status: AgentStatus,
    pub max_conversations: i64,
    pub current_conversations: i64,
}

/// Conversation counts per status within one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub active: i64,
    pub waiting_for_human: i64,
    pub handed_off: i64,
    pub closed: i64,
}

/// Summary statistics accompanying a queue listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub counts: StatusCounts,
    /// Mean `now - created_at` over the currently queued entries, in
    /// milliseconds. `None` when the queue is empty.
    pub average_wait_ms: Option<i64>,
}

/// Queued conversations ordered by `(priority DESC, created_at ASC)`,
/// plus summary stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueView {
    pub entries: Vec<Conversation>,
    pub stats: QueueStats,
}
