// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration using Figment.
//!
//! Merge order (later overrides earlier): compiled defaults,
//! `/etc/switchboard/switchboard.toml`, the user XDG config,
//! `./switchboard.toml`, then `SWITCHBOARD_*` environment variables.
//! All sections reject unknown keys at startup.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Gateway bind address and transport auth.
    #[serde(default)]
    pub server: ServerSection,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageSection,

    /// Event stream tuning.
    #[serde(default)]
    pub stream: StreamSection,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSection,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport bearer token. The gateway refuses to start without one.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8743
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "switchboard.db".to_string()
}

/// Event stream tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    /// Seconds of silence between keepalive frames.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// Per-subscriber event buffer; a dashboard falling further behind
    /// than this is disconnected.
    #[serde(default = "default_buffer_events")]
    pub buffer_events: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive_secs(),
            buffer_events: default_buffer_events(),
        }
    }
}

fn default_keepalive_secs() -> u64 {
    15
}

fn default_buffer_events() -> usize {
    64
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (tests and diagnostics).
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file("/etc/switchboard/switchboard.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("switchboard/switchboard.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("switchboard.toml"))
        .merge(env_provider())
}

/// `SWITCHBOARD_SERVER_BEARER_TOKEN` must map to `server.bearer_token`,
/// not `server.bearer.token`, so the section prefix is split explicitly
/// instead of splitting on every underscore.
fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("stream_", "stream.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
