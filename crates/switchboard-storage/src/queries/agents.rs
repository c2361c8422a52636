// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent identity and availability operations.
//!
//! `current_conversations` is written only by the assignment, return, and
//! resolve transactions in [`super::handoff`]. The availability upsert
//! here deliberately never touches it.

use std::str::FromStr;

use rusqlite::params;
use switchboard_core::types::{AgentStatus, DEFAULT_MAX_CONVERSATIONS};
use switchboard_core::{AgentId, ConflictReason, OrganizationId, SwitchboardError};

use crate::database::Database;
use crate::models::{AgentAvailability, AgentOverview, AgentProfile};
use crate::queries::conversations::text_column_err;

pub(crate) fn availability_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AgentAvailability> {
    let status: String = row.get(2)?;
    Ok(AgentAvailability {
        agent_id: AgentId(row.get(0)?),
        organization_id: OrganizationId(row.get(1)?),
        status: AgentStatus::from_str(&status).map_err(|e| text_column_err(2, e))?,
        max_conversations: row.get(3)?,
        current_conversations: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn select_availability(
    conn: &rusqlite::Connection,
    agent_id: &str,
    organization_id: &str,
) -> rusqlite::Result<Option<AgentAvailability>> {
    let mut stmt = conn.prepare(
        "SELECT agent_id, organization_id, status, max_conversations,
                current_conversations, updated_at
         FROM agent_availability
         WHERE agent_id = ?1 AND organization_id = ?2",
    )?;
    let result = stmt.query_row(params![agent_id, organization_id], availability_from_row);
    match result {
        Ok(availability) => Ok(Some(availability)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Insert the default offline row if the agent has none yet.
pub(crate) fn ensure_availability_row(
    conn: &rusqlite::Connection,
    agent_id: &str,
    organization_id: &str,
    now: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO agent_availability
           (agent_id, organization_id, status, max_conversations, current_conversations, updated_at)
         VALUES (?1, ?2, 'offline', ?3, 0, ?4)
         ON CONFLICT (agent_id, organization_id) DO NOTHING",
        params![agent_id, organization_id, DEFAULT_MAX_CONVERSATIONS, now],
    )?;
    Ok(())
}

/// Upsert an agent identity record (seeding; the dashboard owns these).
pub async fn upsert_agent(db: &Database, profile: &AgentProfile) -> Result<(), SwitchboardError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agents (id, organization_id, display_name, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (id, organization_id)
                 DO UPDATE SET display_name = excluded.display_name",
                params![
                    profile.id.0,
                    profile.organization_id.0,
                    profile.display_name,
                    profile.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert an agent's availability without touching the live counter.
///
/// `max_conversations = None` keeps the existing ceiling (or the default
/// for a new row). Lowering the ceiling below the live count is rejected
/// before any write so the capacity invariant cannot be violated.
pub async fn set_availability(
    db: &Database,
    organization_id: &OrganizationId,
    agent_id: &AgentId,
    status: AgentStatus,
    max_conversations: Option<i64>,
) -> Result<AgentAvailability, SwitchboardError> {
    let organization_id = organization_id.0.clone();
    let agent_id_raw = agent_id.0.clone();
    let agent_id = agent_id.clone();
    let now = switchboard_core::time::now_rfc3339();

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            ensure_availability_row(&tx, &agent_id_raw, &organization_id, &now)?;

            if let Some(requested) = max_conversations {
                let current: i64 = tx.query_row(
                    "SELECT current_conversations FROM agent_availability
                     WHERE agent_id = ?1 AND organization_id = ?2",
                    params![agent_id_raw, organization_id],
                    |row| row.get(0),
                )?;
                if requested < current {
                    return Ok(Err(SwitchboardError::Conflict(
                        ConflictReason::MaxBelowCurrent {
                            requested,
                            current,
                        },
                    )));
                }
                tx.execute(
                    "UPDATE agent_availability
                     SET status = ?3, max_conversations = ?4, updated_at = ?5
                     WHERE agent_id = ?1 AND organization_id = ?2",
                    params![agent_id_raw, organization_id, status.to_string(), requested, now],
                )?;
            } else {
                tx.execute(
                    "UPDATE agent_availability
                     SET status = ?3, updated_at = ?4
                     WHERE agent_id = ?1 AND organization_id = ?2",
                    params![agent_id_raw, organization_id, status.to_string(), now],
                )?;
            }

            let availability = select_availability(&tx, &agent_id_raw, &organization_id)?;
            tx.commit()?;
            match availability {
                Some(availability) => Ok(Ok(availability)),
                None => Ok(Err(SwitchboardError::Internal(format!(
                    "availability row vanished for agent {agent_id}"
                )))),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    outcome
}

/// Every agent identity in the organization joined with availability.
///
/// Agents without an availability row report the offline defaults.
pub async fn get_agents(
    db: &Database,
    organization_id: &OrganizationId,
) -> Result<Vec<AgentOverview>, SwitchboardError> {
    let organization_id = organization_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.display_name, av.status, av.max_conversations,
                        av.current_conversations
                 FROM agents a
                 LEFT JOIN agent_availability av
                   ON av.agent_id = a.id AND av.organization_id = a.organization_id
                 WHERE a.organization_id = ?1
                 ORDER BY a.display_name ASC, a.id ASC",
            )?;
            let rows = stmt.query_map(params![organization_id], |row| {
                let status: Option<String> = row.get(2)?;
                let status = match status {
                    Some(s) => AgentStatus::from_str(&s).map_err(|e| text_column_err(2, e))?,
                    None => AgentStatus::Offline,
                };
                Ok(AgentOverview {
                    agent_id: AgentId(row.get(0)?),
                    display_name: row.get(1)?,
                    status,
                    max_conversations: row
                        .get::<_, Option<i64>>(3)?
                        .unwrap_or(DEFAULT_MAX_CONVERSATIONS),
                    current_conversations: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                })
            })?;
            let mut agents = Vec::new();
            for row in rows {
                agents.push(row?);
            }
            Ok(agents)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
