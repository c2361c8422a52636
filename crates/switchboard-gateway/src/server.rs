// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. The health probe is
//! public; everything else sits behind the bearer-token middleware.

use std::time::Duration;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use switchboard_bus::EventBus;
use switchboard_core::SwitchboardError;
use switchboard_engine::{AgentRegistry, QueueManager, RoutingEngine};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::sse;

/// Health state for the unauthenticated probe.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: RoutingEngine,
    pub registry: AgentRegistry,
    pub queue: QueueManager,
    pub bus: EventBus,
    pub auth: AuthConfig,
    pub health: HealthState,
    /// Silence interval between keepalive frames on event streams.
    pub keepalive: Duration,
}

/// Gateway server configuration (mirrors the `[server]` config section).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the full router over the given state.
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated public route (liveness probe).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    // Routes requiring the transport bearer token.
    let api_routes = Router::new()
        .route("/v1/conversations/{id}", get(handlers::get_conversation))
        .route("/v1/conversations/{id}/handoff", post(handlers::post_handoff))
        .route("/v1/conversations/{id}/assign", post(handlers::post_assign))
        .route(
            "/v1/conversations/{id}/messages",
            post(handlers::post_agent_message),
        )
        .route("/v1/conversations/{id}/return", post(handlers::post_return))
        .route("/v1/conversations/{id}/resolve", post(handlers::post_resolve))
        .route("/v1/messages/{id}/feedback", post(handlers::post_feedback))
        .route("/v1/agents/availability", put(handlers::put_availability))
        .route("/v1/agents", get(handlers::get_agents))
        .route("/v1/queue", get(handlers::get_queue))
        .route("/v1/events", get(sse::stream_events))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway server; runs until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), SwitchboardError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SwitchboardError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| SwitchboardError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
