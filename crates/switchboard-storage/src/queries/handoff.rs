// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transactional conversation state transitions.
//!
//! Every operation here runs inside one SQLite transaction: all
//! preconditions are checked before the first write, and a rejected
//! precondition rolls the transaction back, so nothing partial ever
//! commits. The assignment path uses conditional UPDATEs
//! (`... WHERE assigned_to IS NULL`, `... WHERE current_conversations <
//! max_conversations`) as a compare-and-swap, which is the minimum
//! contract a replacement store must honor: read committed isolation
//! plus conditional updates.

use rusqlite::params;
use switchboard_core::types::{ConversationStatus, MessageRole};
use switchboard_core::{AgentId, ConflictReason, ConversationId, MessageId, SwitchboardError};

use crate::database::Database;
use crate::models::{AgentAvailability, Conversation};
use crate::queries::agents::{ensure_availability_row, select_availability};
use crate::queries::conversations::select_conversation;

/// Result of a handoff request.
#[derive(Debug, Clone)]
pub enum HandoffOutcome {
    /// The conversation moved to `waiting_for_human`.
    Queued(Conversation),
    /// Already waiting or handed off; nothing changed.
    AlreadyPending(Conversation),
}

impl HandoffOutcome {
    pub fn conversation(&self) -> &Conversation {
        match self {
            Self::Queued(c) | Self::AlreadyPending(c) => c,
        }
    }
}

/// Result of an assignment.
#[derive(Debug, Clone)]
pub enum AssignOutcome {
    /// The agent claimed the conversation; the counter was incremented.
    Assigned {
        conversation: Conversation,
        availability: AgentAvailability,
    },
    /// The same agent already held it; nothing changed.
    AlreadyAssigned(Conversation),
}

impl AssignOutcome {
    pub fn conversation(&self) -> &Conversation {
        match self {
            Self::Assigned { conversation, .. } | Self::AlreadyAssigned(conversation) => {
                conversation
            }
        }
    }
}

/// Result of returning a conversation to the bot.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub conversation: Conversation,
    /// The prior assignee's availability after the decrement.
    pub availability: AgentAvailability,
}

/// Result of resolving a conversation.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub conversation: Conversation,
    /// Present when an assigned agent was released by the close.
    pub released: Option<AgentAvailability>,
}

fn not_found(id: &str) -> SwitchboardError {
    SwitchboardError::NotFound {
        entity: "conversation",
        id: id.to_string(),
    }
}

fn closed_conflict() -> SwitchboardError {
    SwitchboardError::Conflict(ConflictReason::ConversationClosed)
}

/// Move a conversation into `waiting_for_human`, recording priority and
/// tags. Idempotent while already waiting or handed off. An optional
/// note is stored as an internal-note message visible to agents only.
pub async fn request_handoff(
    db: &Database,
    conversation_id: &ConversationId,
    priority: Option<i64>,
    tags: Option<Vec<String>>,
    note: Option<String>,
) -> Result<HandoffOutcome, SwitchboardError> {
    let id = conversation_id.0.clone();
    let now = switchboard_core::time::now_rfc3339();
    let note_id = MessageId::generate().0;

    let tags = match tags {
        Some(mut tags) => {
            tags.sort();
            tags.dedup();
            Some(serde_json::to_string(&tags).map_err(|e| {
                SwitchboardError::Internal(format!("unserializable tags: {e}"))
            })?)
        }
        None => None,
    };

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            match conversation.status {
                ConversationStatus::Closed => return Ok(Err(closed_conflict())),
                ConversationStatus::WaitingForHuman | ConversationStatus::HandedOff => {
                    return Ok(Ok(HandoffOutcome::AlreadyPending(conversation)));
                }
                ConversationStatus::Active => {}
            }

            let updated = tx.execute(
                "UPDATE conversations
                 SET status = 'waiting_for_human',
                     priority = COALESCE(?2, priority),
                     tags = COALESCE(?3, tags)
                 WHERE id = ?1 AND status = 'active'",
                params![id, priority, tags],
            )?;
            if updated == 0 {
                return Ok(Err(closed_conflict()));
            }

            if let Some(note) = note {
                tx.execute(
                    "INSERT INTO messages
                       (id, conversation_id, role, content, is_from_agent, internal_note, created_at)
                     VALUES (?1, ?2, ?3, '', 0, ?4, ?5)",
                    params![note_id, id, MessageRole::Assistant.to_string(), note, now],
                )?;
            }

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            tx.commit()?;
            Ok(Ok(HandoffOutcome::Queued(conversation)))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Claim a conversation for an agent, enforcing capacity.
///
/// Exactly one of two concurrent claims on the same idle conversation
/// wins; the loser observes `Conflict(AlreadyAssigned)`. A claim beyond
/// the agent's ceiling observes `Conflict(AtCapacity)` and changes
/// nothing.
pub async fn assign_to_agent(
    db: &Database,
    conversation_id: &ConversationId,
    agent_id: &AgentId,
) -> Result<AssignOutcome, SwitchboardError> {
    let id = conversation_id.0.clone();
    let agent = agent_id.0.clone();
    let now = switchboard_core::time::now_rfc3339();

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            if conversation.status == ConversationStatus::Closed {
                return Ok(Err(closed_conflict()));
            }
            match &conversation.assigned_to {
                Some(current) if current.0 == agent => {
                    return Ok(Ok(AssignOutcome::AlreadyAssigned(conversation)));
                }
                Some(current) => {
                    return Ok(Err(SwitchboardError::Conflict(
                        ConflictReason::AlreadyAssigned {
                            assigned_to: current.clone(),
                        },
                    )));
                }
                None => {}
            }

            let organization = conversation.organization_id.0.clone();
            ensure_availability_row(&tx, &agent, &organization, &now)?;

            // Capacity check and increment as one conditional update.
            let incremented = tx.execute(
                "UPDATE agent_availability
                 SET current_conversations = current_conversations + 1, updated_at = ?3
                 WHERE agent_id = ?1 AND organization_id = ?2
                   AND current_conversations < max_conversations",
                params![agent, organization, now],
            )?;
            if incremented == 0 {
                let max: i64 = tx.query_row(
                    "SELECT max_conversations FROM agent_availability
                     WHERE agent_id = ?1 AND organization_id = ?2",
                    params![agent, organization],
                    |row| row.get(0),
                )?;
                return Ok(Err(SwitchboardError::Conflict(ConflictReason::AtCapacity {
                    agent_id: AgentId(agent.clone()),
                    max_conversations: max,
                })));
            }

            // Compare-and-swap on the assignment itself.
            let claimed = tx.execute(
                "UPDATE conversations
                 SET status = 'handed_off', assigned_to = ?2
                 WHERE id = ?1 AND status <> 'closed' AND assigned_to IS NULL",
                params![id, agent],
            )?;
            if claimed == 0 {
                return Ok(Err(SwitchboardError::Conflict(
                    ConflictReason::AlreadyAssigned {
                        assigned_to: AgentId(agent.clone()),
                    },
                )));
            }

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            let Some(availability) = select_availability(&tx, &agent, &organization)? else {
                return Ok(Err(SwitchboardError::Internal(format!(
                    "availability row vanished for agent {agent}"
                ))));
            };
            tx.commit()?;
            Ok(Ok(AssignOutcome::Assigned {
                conversation,
                availability,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Hand a conversation back to the bot, releasing the assigned agent.
pub async fn return_to_bot(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<ReturnOutcome, SwitchboardError> {
    let id = conversation_id.0.clone();
    let now = switchboard_core::time::now_rfc3339();

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            if conversation.status == ConversationStatus::Closed {
                return Ok(Err(closed_conflict()));
            }
            if conversation.status != ConversationStatus::HandedOff {
                return Ok(Err(SwitchboardError::InvalidState(format!(
                    "return_to_bot requires handed_off, conversation is {}",
                    conversation.status
                ))));
            }
            let Some(agent) = conversation.assigned_to.clone() else {
                return Ok(Err(SwitchboardError::Internal(format!(
                    "handed_off conversation {id} has no assignee"
                ))));
            };
            let organization = conversation.organization_id.0.clone();

            tx.execute(
                "UPDATE conversations SET status = 'active', assigned_to = NULL WHERE id = ?1",
                params![id],
            )?;
            tx.execute(
                "UPDATE agent_availability
                 SET current_conversations = MAX(0, current_conversations - 1), updated_at = ?3
                 WHERE agent_id = ?1 AND organization_id = ?2",
                params![agent.0, organization, now],
            )?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            let Some(availability) = select_availability(&tx, &agent.0, &organization)? else {
                return Ok(Err(SwitchboardError::Internal(format!(
                    "availability row vanished for agent {agent}"
                ))));
            };
            tx.commit()?;
            Ok(Ok(ReturnOutcome {
                conversation,
                availability,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Close a conversation. Terminal: closed conversations reject every
/// further mutation, including a second resolve.
pub async fn resolve(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<ResolveOutcome, SwitchboardError> {
    let id = conversation_id.0.clone();
    let now = switchboard_core::time::now_rfc3339();

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            if conversation.status == ConversationStatus::Closed {
                return Ok(Err(closed_conflict()));
            }
            let prior_agent = conversation.assigned_to.clone();
            let organization = conversation.organization_id.0.clone();

            tx.execute(
                "UPDATE conversations
                 SET status = 'closed', assigned_to = NULL, closed_at = ?2
                 WHERE id = ?1",
                params![id, now],
            )?;

            let released = match &prior_agent {
                Some(agent) => {
                    tx.execute(
                        "UPDATE agent_availability
                         SET current_conversations = MAX(0, current_conversations - 1),
                             updated_at = ?3
                         WHERE agent_id = ?1 AND organization_id = ?2",
                        params![agent.0, organization, now],
                    )?;
                    select_availability(&tx, &agent.0, &organization)?
                }
                None => None,
            };

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(not_found(&id)));
            };
            tx.commit()?;
            Ok(Ok(ResolveOutcome {
                conversation,
                released,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}
