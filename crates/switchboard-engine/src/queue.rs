// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue listing for dashboards.

use std::sync::Arc;

use switchboard_core::types::QueueView;
use switchboard_core::{OrganizationId, SwitchboardError};
use switchboard_storage::Database;
use switchboard_storage::queries::queue;

/// Answers "who is waiting, and for how long" per organization.
///
/// Read-only: the listing reads committed state directly, so it always
/// reflects the most recent routing transaction.
#[derive(Clone)]
pub struct QueueManager {
    db: Arc<Database>,
}

impl QueueManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Queued conversations ordered `(priority DESC, created_at ASC)`
    /// plus per-status counts and the average wait of queued entries.
    pub async fn list_queue(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<QueueView, SwitchboardError> {
        queue::list_queue(&self.db, organization_id).await
    }
}
