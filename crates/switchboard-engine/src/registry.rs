// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent availability tracking.
//!
//! The registry owns the availability rows but never the live counter:
//! `current_conversations` moves only inside the routing engine's
//! assignment, return, and resolve transactions.

use std::sync::Arc;

use tracing::info;

use switchboard_bus::EventBus;
use switchboard_core::types::{AgentAvailability, AgentOverview, AgentStatus};
use switchboard_core::{AgentId, Event, OrganizationId, SwitchboardError};
use switchboard_storage::Database;
use switchboard_storage::queries::agents;

use crate::routing::agent_status_event;

/// Tracks each agent's availability status and capacity ceiling.
#[derive(Clone)]
pub struct AgentRegistry {
    db: Arc<Database>,
    bus: EventBus,
}

impl AgentRegistry {
    pub fn new(db: Arc<Database>, bus: EventBus) -> Self {
        Self { db, bus }
    }

    /// Upsert an agent's availability. Never touches the live counter.
    ///
    /// `max_conversations = None` keeps the current ceiling. A ceiling
    /// below 1, or below the agent's live load, is rejected before any
    /// write.
    pub async fn set_availability(
        &self,
        organization_id: &OrganizationId,
        agent_id: &AgentId,
        status: AgentStatus,
        max_conversations: Option<i64>,
    ) -> Result<AgentAvailability, SwitchboardError> {
        if let Some(max) = max_conversations {
            if max < 1 {
                return Err(SwitchboardError::InvalidState(format!(
                    "max_conversations must be at least 1, got {max}"
                )));
            }
        }

        let availability =
            agents::set_availability(&self.db, organization_id, agent_id, status, max_conversations)
                .await?;

        info!(
            agent = %availability.agent_id,
            status = %availability.status,
            max = availability.max_conversations,
            "agent availability updated"
        );
        self.bus.publish(&Event::now(agent_status_event(&availability)));
        Ok(availability)
    }

    /// Every agent identity in the organization joined with availability;
    /// agents without a row report `{offline, 3, 0}`.
    pub async fn get_agents(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<AgentOverview>, SwitchboardError> {
        agents::get_agents(&self.db, organization_id).await
    }
}
