// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber filter predicates.

use switchboard_core::{ChatbotId, ConversationId, EventPayload, OrganizationId};

/// Constraints a subscriber places on delivered events.
///
/// All present constraints must hold for an event to match. The default
/// filter matches everything; dashboards normally scope at least by
/// organization. Agent-level events (`agent.assigned` aside) carry no
/// conversation scope, so conversation- and chatbot-constrained filters
/// only ever see conversation-scoped events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub organization_id: Option<OrganizationId>,
    pub conversation_id: Option<ConversationId>,
    pub chatbot_id: Option<ChatbotId>,
}

impl EventFilter {
    /// Match every event for one organization.
    pub fn organization(organization_id: OrganizationId) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Self::default()
        }
    }

    /// Additionally require a specific conversation.
    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    /// Additionally require a specific chatbot.
    pub fn with_chatbot(mut self, chatbot_id: ChatbotId) -> Self {
        self.chatbot_id = Some(chatbot_id);
        self
    }

    /// Whether an event payload satisfies every present constraint.
    pub fn matches(&self, payload: &EventPayload) -> bool {
        if let Some(org) = &self.organization_id {
            if payload.organization_id() != org {
                return false;
            }
        }
        if let Some(conversation) = &self.conversation_id {
            if payload.conversation_id() != Some(conversation) {
                return false;
            }
        }
        if let Some(chatbot) = &self.chatbot_id {
            if payload.chatbot_id() != Some(chatbot) {
                return false;
            }
        }
        true
    }
}
