// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Error bodies carry a stable `code` so the dashboard can tell "agent
//! full" from "already claimed" without parsing prose.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use switchboard_core::types::{
    AgentAvailability, AgentOverview, AgentStatus, Conversation, Message, QueueView,
};
use switchboard_core::{AgentId, ConversationId, MessageId, SwitchboardError};
use switchboard_engine::HandoffRequest;

use crate::auth::Identity;
use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Whether the dashboard should refresh and retry.
    pub retryable: bool,
}

/// Wrapper mapping engine errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub SwitchboardError);

impl From<SwitchboardError> for ApiError {
    fn from(err: SwitchboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SwitchboardError::NotFound { .. } => StatusCode::NOT_FOUND,
            SwitchboardError::Conflict(_) => StatusCode::CONFLICT,
            SwitchboardError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SwitchboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SwitchboardError::Storage { .. }
            | SwitchboardError::Config(_)
            | SwitchboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code(),
            retryable: self.0.is_retryable_conflict(),
        };
        (status, Json(body)).into_response()
    }
}

/// Request body for POST /v1/conversations/{id}/handoff.
#[derive(Debug, Default, Deserialize)]
pub struct HandoffBody {
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for POST /v1/conversations/{id}/assign.
#[derive(Debug, Default, Deserialize)]
pub struct AssignBody {
    /// Agent to assign. Defaults to the caller's own identity.
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Request body for POST /v1/conversations/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct AgentMessageBody {
    pub content: String,
    #[serde(default)]
    pub internal_note: Option<String>,
}

/// Response body for POST /v1/conversations/{id}/messages.
#[derive(Debug, Serialize)]
pub struct AgentMessageResponse {
    pub conversation: Conversation,
    pub message: Message,
}

/// Request body for POST /v1/messages/{id}/feedback.
#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for PUT /v1/agents/availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    pub status: AgentStatus,
    #[serde(default)]
    pub max_conversations: Option<i64>,
}

/// Response body for GET /v1/agents.
#[derive(Debug, Serialize)]
pub struct AgentListResponse {
    pub agents: Vec<AgentOverview>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /v1/conversations/{id}
///
/// Snapshot read, step one of the snapshot-then-subscribe protocol.
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.engine.get_conversation(&ConversationId(id)).await?;
    Ok(Json(conversation))
}

/// POST /v1/conversations/{id}/handoff
pub async fn post_handoff(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<HandoffBody>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .engine
        .request_handoff(
            &ConversationId(id),
            HandoffRequest {
                priority: body.priority,
                tags: body.tags,
                note: body.note,
            },
        )
        .await?;
    Ok(Json(conversation))
}

/// POST /v1/conversations/{id}/assign
pub async fn post_assign(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<Conversation>, ApiError> {
    let agent = match body.agent_id {
        Some(agent) => AgentId(agent),
        None => identity.require_agent()?,
    };
    let conversation = state
        .engine
        .assign_to_agent(&ConversationId(id), &agent)
        .await?;
    Ok(Json(conversation))
}

/// POST /v1/conversations/{id}/messages
pub async fn post_agent_message(
    State(state): State<GatewayState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<AgentMessageBody>,
) -> Result<Json<AgentMessageResponse>, ApiError> {
    let agent = identity.require_agent()?;
    let (conversation, message) = state
        .engine
        .send_agent_message(&ConversationId(id), &agent, body.content, body.internal_note)
        .await?;
    Ok(Json(AgentMessageResponse {
        conversation,
        message,
    }))
}

/// POST /v1/conversations/{id}/return
pub async fn post_return(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.engine.return_to_bot(&ConversationId(id)).await?;
    Ok(Json(conversation))
}

/// POST /v1/conversations/{id}/resolve
pub async fn post_resolve(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.engine.resolve(&ConversationId(id)).await?;
    Ok(Json(conversation))
}

/// POST /v1/messages/{id}/feedback
pub async fn post_feedback(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<FeedbackBody>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .engine
        .record_feedback(&MessageId(id), body.rating, body.comment)
        .await?;
    Ok(Json(message))
}

/// PUT /v1/agents/availability
pub async fn put_availability(
    State(state): State<GatewayState>,
    identity: Identity,
    Json(body): Json<AvailabilityBody>,
) -> Result<Json<AgentAvailability>, ApiError> {
    let agent = identity.require_agent()?;
    let availability = state
        .registry
        .set_availability(
            &identity.organization_id,
            &agent,
            body.status,
            body.max_conversations,
        )
        .await?;
    Ok(Json(availability))
}

/// GET /v1/agents
pub async fn get_agents(
    State(state): State<GatewayState>,
    identity: Identity,
) -> Result<Json<AgentListResponse>, ApiError> {
    let agents = state.registry.get_agents(&identity.organization_id).await?;
    Ok(Json(AgentListResponse { agents }))
}

/// GET /v1/queue
pub async fn get_queue(
    State(state): State<GatewayState>,
    identity: Identity,
) -> Result<Json<QueueView>, ApiError> {
    let view = state.queue.list_queue(&identity.organization_id).await?;
    Ok(Json(view))
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}
