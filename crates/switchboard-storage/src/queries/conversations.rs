// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation reads and seeding writes.
//!
//! Status and assignment transitions live in [`super::handoff`]; this
//! module only creates records and reads them back.

use std::str::FromStr;

use rusqlite::params;
use switchboard_core::types::ConversationStatus;
use switchboard_core::{
    AgentId, ChatbotId, ConversationId, OrganizationId, SessionId, SwitchboardError,
};

use crate::database::Database;
use crate::models::{Chatbot, Conversation};

/// Shared SELECT head: conversation columns plus the owning organization
/// resolved through the chatbot join.
pub(crate) const CONVERSATION_SELECT: &str = "SELECT c.id, c.session_id, c.chatbot_id, b.organization_id, c.status, c.assigned_to,
            c.priority, c.tags, c.first_response_time_ms, c.last_message_at,
            c.created_at, c.closed_at
     FROM conversations c
     JOIN chatbots b ON b.id = c.chatbot_id";

pub(crate) fn text_column_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

/// Map one row of [`CONVERSATION_SELECT`] into a model.
pub(crate) fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let status: String = row.get(4)?;
    let tags: String = row.get(7)?;
    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        session_id: SessionId(row.get(1)?),
        chatbot_id: ChatbotId(row.get(2)?),
        organization_id: OrganizationId(row.get(3)?),
        status: ConversationStatus::from_str(&status).map_err(|e| text_column_err(4, e))?,
        assigned_to: row.get::<_, Option<String>>(5)?.map(AgentId),
        priority: row.get(6)?,
        tags: serde_json::from_str(&tags).map_err(|e| text_column_err(7, e))?,
        first_response_time_ms: row.get(8)?,
        last_message_at: row.get(9)?,
        created_at: row.get(10)?,
        closed_at: row.get(11)?,
    })
}

/// Fetch one conversation inside an already-running statement context.
pub(crate) fn select_conversation(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Conversation>> {
    let mut stmt = conn.prepare(&format!("{CONVERSATION_SELECT} WHERE c.id = ?1"))?;
    let result = stmt.query_row(params![id], conversation_from_row);
    match result {
        Ok(conversation) => Ok(Some(conversation)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create a chatbot record (tenancy seeding; the dashboard owns these).
pub async fn create_chatbot(db: &Database, chatbot: &Chatbot) -> Result<(), SwitchboardError> {
    let chatbot = chatbot.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chatbots (id, organization_id, name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    chatbot.id.0,
                    chatbot.organization_id.0,
                    chatbot.name,
                    chatbot.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create a conversation record.
///
/// The `organization_id` field of the model is derived from the chatbot
/// join on every read and is not stored here.
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), SwitchboardError> {
    let c = conversation.clone();
    let tags = serde_json::to_string(&c.tags)
        .map_err(|e| SwitchboardError::Internal(format!("unserializable tags: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations
                   (id, session_id, chatbot_id, status, assigned_to, priority, tags,
                    first_response_time_ms, last_message_at, created_at, closed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    c.id.0,
                    c.session_id.0,
                    c.chatbot_id.0,
                    c.status.to_string(),
                    c.assigned_to.map(|a| a.0),
                    c.priority,
                    tags,
                    c.first_response_time_ms,
                    c.last_message_at,
                    c.created_at,
                    c.closed_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a conversation snapshot by id.
pub async fn get_conversation(
    db: &Database,
    id: &ConversationId,
) -> Result<Option<Conversation>, SwitchboardError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| select_conversation(conn, &id))
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::time::now_rfc3339;
    use switchboard_core::{ChatbotId, OrganizationId, SessionId};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_chatbot(id: &str, org: &str) -> Chatbot {
        Chatbot {
            id: ChatbotId(id.to_string()),
            organization_id: OrganizationId(org.to_string()),
            name: "Support Bot".to_string(),
            created_at: now_rfc3339(),
        }
    }

    fn make_conversation(id: &str, chatbot: &str) -> Conversation {
        Conversation {
            id: ConversationId(id.to_string()),
            session_id: SessionId(format!("sess-{id}")),
            chatbot_id: ChatbotId(chatbot.to_string()),
            organization_id: OrganizationId(String::new()),
            status: ConversationStatus::Active,
            assigned_to: None,
            priority: 0,
            tags: vec![],
            first_response_time_ms: None,
            last_message_at: None,
            created_at: now_rfc3339(),
            closed_at: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_resolves_organization_through_chatbot() {
        let (db, _dir) = setup_db().await;
        create_chatbot(&db, &make_chatbot("bot-1", "org-1")).await.unwrap();
        create_conversation(&db, &make_conversation("c-1", "bot-1"))
            .await
            .unwrap();

        let fetched = get_conversation(&db, &ConversationId("c-1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.organization_id.0, "org-1");
        assert_eq!(fetched.status, ConversationStatus::Active);
        assert!(fetched.assigned_to.is_none());
        assert!(fetched.tags.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_conversation(&db, &ConversationId("missing".into()))
            .await
            .unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn tags_round_trip_as_json() {
        let (db, _dir) = setup_db().await;
        create_chatbot(&db, &make_chatbot("bot-1", "org-1")).await.unwrap();
        let mut conversation = make_conversation("c-1", "bot-1");
        conversation.tags = vec!["billing".to_string(), "vip".to_string()];
        create_conversation(&db, &conversation).await.unwrap();

        let fetched = get_conversation(&db, &conversation.id).await.unwrap().unwrap();
        assert_eq!(fetched.tags, vec!["billing", "vip"]);
        db.close().await.unwrap();
    }
}
