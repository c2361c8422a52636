// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport auth and identity extraction.
//!
//! Two layers, deliberately separate:
//! - [`auth_middleware`] checks the shared bearer token. When no token is
//!   configured, all requests are rejected (fail-closed).
//! - [`Identity`] reads the already-authenticated `x-organization-id` /
//!   `x-agent-id` headers injected by the upstream dashboard layer. The
//!   engine trusts these; permission checks happened before the request
//!   reached us.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};

use switchboard_core::{AgentId, OrganizationId, SwitchboardError};

use crate::handlers::ApiError;

/// Transport authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects everything.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that validates the `Authorization: Bearer` header.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected) = auth.bearer_token else {
        tracing::error!("gateway has no auth configured, rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// The already-authenticated caller identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub organization_id: OrganizationId,
    pub agent_id: Option<AgentId>,
}

impl Identity {
    /// The agent id, required for operations performed *as* an agent.
    pub fn require_agent(&self) -> Result<AgentId, ApiError> {
        self.agent_id.clone().ok_or_else(|| {
            ApiError(SwitchboardError::Unauthorized(
                "x-agent-id header required for this operation".to_string(),
            ))
        })
    }
}

fn header_string(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(organization_id) = header_string(parts, "x-organization-id") else {
            return Err(ApiError(SwitchboardError::Unauthorized(
                "x-organization-id header required".to_string(),
            )));
        };
        Ok(Self {
            organization_id: OrganizationId(organization_id),
            agent_id: header_string(parts, "x-agent-id").map(AgentId),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/v1/queue");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn identity_requires_organization_header() {
        let mut parts = parts_with_headers(&[]);
        let result = Identity::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn identity_extracts_agent_when_present() {
        let mut parts =
            parts_with_headers(&[("x-organization-id", "org-1"), ("x-agent-id", "a-1")]);
        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.organization_id.0, "org-1");
        assert_eq!(identity.require_agent().unwrap().0, "a-1");
    }

    #[tokio::test]
    async fn identity_agent_is_optional() {
        let mut parts = parts_with_headers(&[("x-organization-id", "org-1")]);
        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(identity.agent_id.is_none());
        assert!(identity.require_agent().is_err());
    }

    #[test]
    fn auth_config_debug_redacts_token() {
        let config = AuthConfig {
            bearer_token: Some("secret-token".to_string()),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }
}
