// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard serve` command implementation.
//!
//! Wires the application root: one database, one event bus, the routing
//! engine, the agent registry, the queue manager, and the gateway. The
//! bus is constructed here and passed by handle to everything that
//! publishes or subscribes; no component reaches for a global emitter.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use switchboard_bus::EventBus;
use switchboard_core::SwitchboardError;
use switchboard_engine::{AgentRegistry, QueueManager, RoutingEngine};
use switchboard_gateway::{GatewayState, ServerConfig, start_server};
use switchboard_gateway::auth::AuthConfig;
use switchboard_gateway::server::HealthState;
use switchboard_storage::Database;

use crate::config::SwitchboardConfig;
use crate::shutdown;

/// Runs the `switchboard serve` command until SIGINT/SIGTERM.
pub async fn run_serve(config: SwitchboardConfig) -> Result<(), SwitchboardError> {
    init_tracing(&config.log.level);

    info!("starting switchboard serve");

    // Fail-closed: refuse to expose the gateway without transport auth.
    if config.server.bearer_token.is_none() {
        return Err(SwitchboardError::Config(
            "server.bearer_token must be set; the gateway refuses to start without \
             transport auth (set it in switchboard.toml or SWITCHBOARD_SERVER_BEARER_TOKEN)"
                .to_string(),
        ));
    }

    let db = Arc::new(Database::open(&config.storage.database_path).await?);
    info!(path = config.storage.database_path.as_str(), "storage ready");

    let bus = EventBus::new(config.stream.buffer_events);

    let state = GatewayState {
        engine: RoutingEngine::new(Arc::clone(&db), bus.clone()),
        registry: AgentRegistry::new(Arc::clone(&db), bus.clone()),
        queue: QueueManager::new(Arc::clone(&db)),
        bus,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
        },
        keepalive: Duration::from_secs(config.stream.keepalive_secs),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let cancel = shutdown::install_signal_handler();
    start_server(&server_config, state, cancel).await?;

    info!("switchboard serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("switchboard={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
