// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations.
//!
//! Messages are append-only. The only post-insert write is the
//! one-shot feedback pair, guarded by a conditional update.

use std::str::FromStr;

use rusqlite::params;
use switchboard_core::time;
use switchboard_core::types::{ConversationStatus, MessageRole};
use switchboard_core::{AgentId, ConflictReason, ConversationId, MessageId, SwitchboardError};

use crate::database::Database;
use crate::models::{Conversation, Message};
use crate::queries::conversations::{select_conversation, text_column_err};

pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    Ok(Message {
        id: MessageId(row.get(0)?),
        conversation_id: ConversationId(row.get(1)?),
        role: MessageRole::from_str(&role).map_err(|e| text_column_err(2, e))?,
        content: row.get(3)?,
        is_from_agent: row.get(4)?,
        agent_id: row.get::<_, Option<String>>(5)?.map(AgentId),
        internal_note: row.get(6)?,
        feedback_rating: row.get(7)?,
        feedback_comment: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const MESSAGE_COLUMNS: &str = "id, conversation_id, role, content, is_from_agent, agent_id,
            internal_note, feedback_rating, feedback_comment, created_at";

fn select_message(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Message>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"))?;
    let result = stmt.query_row(params![id], message_from_row);
    match result {
        Ok(message) => Ok(Some(message)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Insert a message (end-user and bot traffic; agent messages go through
/// [`send_agent_message`] so the first-response clock is maintained).
pub async fn insert_message(db: &Database, message: &Message) -> Result<(), SwitchboardError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages
                   (id, conversation_id, role, content, is_from_agent, agent_id,
                    internal_note, feedback_rating, feedback_comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    m.id.0,
                    m.conversation_id.0,
                    m.role.to_string(),
                    m.content,
                    m.is_from_agent,
                    m.agent_id.map(|a| a.0),
                    m.internal_note,
                    m.feedback_rating,
                    m.feedback_comment,
                    m.created_at,
                ],
            )?;
            conn.execute(
                "UPDATE conversations SET last_message_at = ?2 WHERE id = ?1",
                params![m.conversation_id.0, m.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a conversation in chronological order.
pub async fn list_messages(
    db: &Database,
    conversation_id: &ConversationId,
) -> Result<Vec<Message>, SwitchboardError> {
    let conversation_id = conversation_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append an agent message to a conversation the agent holds.
///
/// Requires `handed_off` with `assigned_to == agent_id`. Bumps
/// `last_message_at` and, only on the conversation's first agent-authored
/// message, stamps `first_response_time_ms`; the conditional update
/// leaves it untouched forever after.
pub async fn send_agent_message(
    db: &Database,
    conversation_id: &ConversationId,
    agent_id: &AgentId,
    content: String,
    internal_note: Option<String>,
) -> Result<(Conversation, Message), SwitchboardError> {
    let id = conversation_id.0.clone();
    let agent = agent_id.0.clone();
    let message_id = MessageId::generate().0;
    let sent_at = chrono::Utc::now();
    let now = time::to_rfc3339(sent_at);

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(SwitchboardError::NotFound {
                    entity: "conversation",
                    id: id.clone(),
                }));
            };
            if conversation.status == ConversationStatus::Closed {
                return Ok(Err(SwitchboardError::Conflict(
                    ConflictReason::ConversationClosed,
                )));
            }
            if conversation.status != ConversationStatus::HandedOff {
                return Ok(Err(SwitchboardError::InvalidState(format!(
                    "send_agent_message requires handed_off, conversation is {}",
                    conversation.status
                ))));
            }
            match &conversation.assigned_to {
                Some(assignee) if assignee.0 == agent => {}
                Some(assignee) => {
                    return Ok(Err(SwitchboardError::Conflict(ConflictReason::NotAssignee {
                        assigned_to: assignee.clone(),
                    })));
                }
                None => {
                    return Ok(Err(SwitchboardError::Internal(format!(
                        "handed_off conversation {id} has no assignee"
                    ))));
                }
            }

            tx.execute(
                "INSERT INTO messages
                   (id, conversation_id, role, content, is_from_agent, agent_id,
                    internal_note, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7)",
                params![
                    message_id,
                    id,
                    MessageRole::Assistant.to_string(),
                    content,
                    agent,
                    internal_note,
                    now,
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET last_message_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;

            // First agent response only; immutable afterwards.
            let elapsed = match time::elapsed_ms(&conversation.created_at, sent_at) {
                Ok(ms) => ms,
                Err(e) => return Ok(Err(e)),
            };
            tx.execute(
                "UPDATE conversations SET first_response_time_ms = ?2
                 WHERE id = ?1 AND first_response_time_ms IS NULL",
                params![id, elapsed],
            )?;

            let Some(conversation) = select_conversation(&tx, &id)? else {
                return Ok(Err(SwitchboardError::NotFound {
                    entity: "conversation",
                    id: id.clone(),
                }));
            };
            let Some(message) = select_message(&tx, &message_id)? else {
                return Ok(Err(SwitchboardError::Internal(format!(
                    "message {message_id} vanished within its own transaction"
                ))));
            };
            tx.commit()?;
            Ok(Ok((conversation, message)))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Record end-user feedback on a message, at most once.
pub async fn record_feedback(
    db: &Database,
    message_id: &MessageId,
    rating: i64,
    comment: Option<String>,
) -> Result<Message, SwitchboardError> {
    let id = message_id.0.clone();

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(message) = select_message(&tx, &id)? else {
                return Ok(Err(SwitchboardError::NotFound {
                    entity: "message",
                    id: id.clone(),
                }));
            };
            if message.feedback_rating.is_some() || message.feedback_comment.is_some() {
                return Ok(Err(SwitchboardError::Conflict(
                    ConflictReason::FeedbackAlreadyRecorded,
                )));
            }

            tx.execute(
                "UPDATE messages SET feedback_rating = ?2, feedback_comment = ?3
                 WHERE id = ?1 AND feedback_rating IS NULL AND feedback_comment IS NULL",
                params![id, rating, comment],
            )?;

            let Some(message) = select_message(&tx, &id)? else {
                return Ok(Err(SwitchboardError::NotFound {
                    entity: "message",
                    id: id.clone(),
                }));
            };
            tx.commit()?;
            Ok(Ok(message))
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}
