// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue listing for conversations awaiting a human.
//!
//! Read-only. Both the listing and the stats come from the same
//! connection call, so the view always reflects the most recently
//! committed transaction.

use rusqlite::params;
use switchboard_core::{OrganizationId, SwitchboardError, time};

use crate::database::Database;
use crate::models::{QueueStats, QueueView, StatusCounts};
use crate::queries::conversations::{CONVERSATION_SELECT, conversation_from_row};

/// Conversations with `status = waiting_for_human` for the organization,
/// ordered by `(priority DESC, created_at ASC)`, plus summary stats.
pub async fn list_queue(
    db: &Database,
    organization_id: &OrganizationId,
) -> Result<QueueView, SwitchboardError> {
    let organization_id = organization_id.0.clone();
    let now = chrono::Utc::now();

    let view = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{CONVERSATION_SELECT}
                 WHERE b.organization_id = ?1 AND c.status = 'waiting_for_human'
                 ORDER BY c.priority DESC, c.created_at ASC"
            ))?;
            let rows = stmt.query_map(params![organization_id], conversation_from_row)?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }

            let mut counts = StatusCounts::default();
            let mut stmt = conn.prepare(
                "SELECT c.status, COUNT(*)
                 FROM conversations c
                 JOIN chatbots b ON b.id = c.chatbot_id
                 WHERE b.organization_id = ?1
                 GROUP BY c.status",
            )?;
            let rows = stmt.query_map(params![organization_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (status, count) = row?;
                match status.as_str() {
                    "active" => counts.active = count,
                    "waiting_for_human" => counts.waiting_for_human = count,
                    "handed_off" => counts.handed_off = count,
                    "closed" => counts.closed = count,
                    _ => {}
                }
            }

            Ok((entries, counts))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let (entries, counts) = view;
    let average_wait_ms = if entries.is_empty() {
        None
    } else {
        let mut total: i64 = 0;
        for entry in &entries {
            total += time::elapsed_ms(&entry.created_at, now)?;
        }
        Some(total / entries.len() as i64)
    };

    Ok(QueueView {
        entries,
        stats: QueueStats {
            counts,
            average_wait_ms,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::conversations::{create_chatbot, create_conversation};
    use crate::queries::handoff::{assign_to_agent, request_handoff};
    use switchboard_core::time::{now_rfc3339, to_rfc3339};
    use switchboard_core::types::{Chatbot, Conversation, ConversationStatus};
    use switchboard_core::{AgentId, ChatbotId, ConversationId, SessionId};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        for (bot, org) in [("bot-1", "org-1"), ("bot-2", "org-2")] {
            create_chatbot(
                &db,
                &Chatbot {
                    id: ChatbotId(bot.into()),
                    organization_id: OrganizationId(org.into()),
                    name: format!("{bot} bot"),
                    created_at: now_rfc3339(),
                },
            )
            .await
            .unwrap();
        }
        (db, dir)
    }

    async fn seed(db: &Database, id: &str, bot: &str, created_at: String) -> ConversationId {
        let conversation = Conversation {
            id: ConversationId(id.to_string()),
            session_id: SessionId(format!("sess-{id}")),
            chatbot_id: ChatbotId(bot.to_string()),
            organization_id: OrganizationId(String::new()),
            status: ConversationStatus::Active,
            assigned_to: None,
            priority: 0,
            tags: vec![],
            first_response_time_ms: None,
            last_message_at: None,
            created_at,
            closed_at: None,
        };
        create_conversation(db, &conversation).await.unwrap();
        conversation.id
    }

    #[tokio::test]
    async fn queue_orders_by_priority_then_age() {
        let (db, _dir) = setup_db().await;
        let now = chrono::Utc::now();

        // Older low-priority entry, then a younger urgent one.
        let old = seed(&db, "c-old", "bot-1", to_rfc3339(now - chrono::Duration::minutes(10))).await;
        let urgent =
            seed(&db, "c-urgent", "bot-1", to_rfc3339(now - chrono::Duration::minutes(1))).await;
        let older_urgent =
            seed(&db, "c-older-urgent", "bot-1", to_rfc3339(now - chrono::Duration::minutes(5)))
                .await;

        request_handoff(&db, &old, Some(0), None, None).await.unwrap();
        request_handoff(&db, &urgent, Some(5), Some(vec!["billing".into()]), None)
            .await
            .unwrap();
        request_handoff(&db, &older_urgent, Some(5), None, None).await.unwrap();

        let view = list_queue(&db, &OrganizationId("org-1".into())).await.unwrap();
        let ids: Vec<&str> = view.entries.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, vec!["c-older-urgent", "c-urgent", "c-old"]);
        assert_eq!(view.stats.counts.waiting_for_human, 3);
        assert!(view.stats.average_wait_ms.unwrap() > 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_is_tenant_scoped() {
        let (db, _dir) = setup_db().await;
        let mine = seed(&db, "c-mine", "bot-1", now_rfc3339()).await;
        let theirs = seed(&db, "c-theirs", "bot-2", now_rfc3339()).await;
        request_handoff(&db, &mine, None, None, None).await.unwrap();
        request_handoff(&db, &theirs, None, None, None).await.unwrap();

        let view = list_queue(&db, &OrganizationId("org-1".into())).await.unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].id.0, "c-mine");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assigned_conversations_leave_the_queue() {
        let (db, _dir) = setup_db().await;
        let id = seed(&db, "c-1", "bot-1", now_rfc3339()).await;
        request_handoff(&db, &id, None, None, None).await.unwrap();

        assign_to_agent(&db, &id, &AgentId("a-1".into())).await.unwrap();

        let view = list_queue(&db, &OrganizationId("org-1".into())).await.unwrap();
        assert!(view.entries.is_empty());
        assert_eq!(view.stats.average_wait_ms, None);
        assert_eq!(view.stats.counts.handed_off, 1);
        assert_eq!(view.stats.counts.waiting_for_human, 0);

        db.close().await.unwrap();
    }
}
