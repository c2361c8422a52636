// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! `active <-> waiting_for_human -> handed_off <-> active`, with `closed`
//! reachable from every state and absorbing. All invariant checks happen
//! inside the storage transactions; this layer maps outcomes to events
//! and is the only writer of conversation status and assignment.

use std::sync::Arc;

use tracing::{debug, info};

use switchboard_bus::EventBus;
use switchboard_core::event::{
    AgentAssigned, AgentStatusChanged, ConversationStatusChanged, MessagePosted,
};
use switchboard_core::types::{AgentAvailability, Conversation, Message};
use switchboard_core::{AgentId, ConversationId, Event, EventPayload, MessageId, SwitchboardError};
use switchboard_storage::Database;
use switchboard_storage::queries::handoff::{self, AssignOutcome, HandoffOutcome};
use switchboard_storage::queries::{conversations, messages};

/// Parameters of a handoff request.
#[derive(Debug, Clone, Default)]
pub struct HandoffRequest {
    /// Higher is more urgent. `None` keeps the current priority.
    pub priority: Option<i64>,
    /// `None` keeps the current tags.
    pub tags: Option<Vec<String>>,
    /// Recorded as an internal-note message when present.
    pub note: Option<String>,
}

/// The state machine governing a single conversation's bot/human
/// lifecycle.
#[derive(Clone)]
pub struct RoutingEngine {
    db: Arc<Database>,
    bus: EventBus,
}

pub(crate) fn conversation_status_event(conversation: &Conversation) -> EventPayload {
    EventPayload::ConversationStatus(ConversationStatusChanged {
        organization_id: conversation.organization_id.clone(),
        chatbot_id: conversation.chatbot_id.clone(),
        conversation_id: conversation.id.clone(),
        status: conversation.status,
        assigned_to: conversation.assigned_to.clone(),
    })
}

pub(crate) fn agent_status_event(availability: &AgentAvailability) -> EventPayload {
    EventPayload::AgentStatus(AgentStatusChanged {
        organization_id: availability.organization_id.clone(),
        agent_id: availability.agent_id.clone(),
        status: availability.status,
        current_conversations: availability.current_conversations,
        max_conversations: availability.max_conversations,
    })
}

impl RoutingEngine {
    /// The bus is injected by the application root; the engine never
    /// constructs its own.
    pub fn new(db: Arc<Database>, bus: EventBus) -> Self {
        Self { db, bus }
    }

    /// Read-only snapshot, the first half of the snapshot-then-subscribe
    /// protocol dashboards follow.
    pub async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, SwitchboardError> {
        conversations::get_conversation(&self.db, conversation_id)
            .await?
            .ok_or_else(|| SwitchboardError::NotFound {
                entity: "conversation",
                id: conversation_id.0.clone(),
            })
    }

    /// Move a conversation into `waiting_for_human`. Idempotent while
    /// already waiting or handed off: the current snapshot is returned
    /// and no event is re-emitted.
    pub async fn request_handoff(
        &self,
        conversation_id: &ConversationId,
        request: HandoffRequest,
    ) -> Result<Conversation, SwitchboardError> {
        let outcome = handoff::request_handoff(
            &self.db,
            conversation_id,
            request.priority,
            request.tags,
            request.note,
        )
        .await?;

        match outcome {
            HandoffOutcome::Queued(conversation) => {
                info!(
                    conversation = %conversation.id,
                    priority = conversation.priority,
                    "conversation queued for human"
                );
                self.bus
                    .publish(&Event::now(conversation_status_event(&conversation)));
                Ok(conversation)
            }
            HandoffOutcome::AlreadyPending(conversation) => {
                debug!(
                    conversation = %conversation.id,
                    status = %conversation.status,
                    "handoff request was a no-op"
                );
                Ok(conversation)
            }
        }
    }

    /// Claim a conversation for an agent.
    ///
    /// Capacity check, counter increment, and the assignment write share
    /// one transaction; of two concurrent claims exactly one wins and the
    /// other observes `Conflict`.
    pub async fn assign_to_agent(
        &self,
        conversation_id: &ConversationId,
        agent_id: &AgentId,
    ) -> Result<Conversation, SwitchboardError> {
        let outcome = handoff::assign_to_agent(&self.db, conversation_id, agent_id).await?;

        match outcome {
            AssignOutcome::Assigned {
                conversation,
                availability,
            } => {
                info!(
                    conversation = %conversation.id,
                    agent = %agent_id,
                    load = availability.current_conversations,
                    "conversation assigned"
                );
                self.bus
                    .publish(&Event::now(EventPayload::AgentAssigned(AgentAssigned {
                        organization_id: conversation.organization_id.clone(),
                        chatbot_id: conversation.chatbot_id.clone(),
                        conversation_id: conversation.id.clone(),
                        agent_id: agent_id.clone(),
                    })));
                self.bus
                    .publish(&Event::now(conversation_status_event(&conversation)));
                self.bus
                    .publish(&Event::now(agent_status_event(&availability)));
                Ok(conversation)
            }
            AssignOutcome::AlreadyAssigned(conversation) => {
                debug!(
                    conversation = %conversation.id,
                    agent = %agent_id,
                    "assignment was a no-op"
                );
                Ok(conversation)
            }
        }
    }

    /// Append an agent message to a conversation the agent holds.
    pub async fn send_agent_message(
        &self,
        conversation_id: &ConversationId,
        agent_id: &AgentId,
        content: String,
        internal_note: Option<String>,
    ) -> Result<(Conversation, Message), SwitchboardError> {
        let (conversation, message) = messages::send_agent_message(
            &self.db,
            conversation_id,
            agent_id,
            content,
            internal_note,
        )
        .await?;

        debug!(
            conversation = %conversation.id,
            agent = %agent_id,
            message = %message.id,
            "agent message stored"
        );
        self.bus
            .publish(&Event::now(EventPayload::ConversationMessage(MessagePosted {
                organization_id: conversation.organization_id.clone(),
                chatbot_id: conversation.chatbot_id.clone(),
                conversation_id: conversation.id.clone(),
                message: message.clone(),
            })));
        Ok((conversation, message))
    }

    /// Hand a conversation back to the bot, releasing the agent.
    pub async fn return_to_bot(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, SwitchboardError> {
        let outcome = handoff::return_to_bot(&self.db, conversation_id).await?;

        info!(
            conversation = %outcome.conversation.id,
            agent = %outcome.availability.agent_id,
            "conversation returned to bot"
        );
        self.bus
            .publish(&Event::now(conversation_status_event(&outcome.conversation)));
        self.bus
            .publish(&Event::now(agent_status_event(&outcome.availability)));
        Ok(outcome.conversation)
    }

    /// Close a conversation. Terminal.
    pub async fn resolve(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, SwitchboardError> {
        let outcome = handoff::resolve(&self.db, conversation_id).await?;

        info!(conversation = %outcome.conversation.id, "conversation resolved");
        self.bus
            .publish(&Event::now(conversation_status_event(&outcome.conversation)));
        if let Some(released) = &outcome.released {
            self.bus.publish(&Event::now(agent_status_event(released)));
        }
        Ok(outcome.conversation)
    }

    /// Record end-user feedback on a message, at most once. No event.
    pub async fn record_feedback(
        &self,
        message_id: &MessageId,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Message, SwitchboardError> {
        messages::record_feedback(&self.db, message_id, rating, comment).await
    }
}
