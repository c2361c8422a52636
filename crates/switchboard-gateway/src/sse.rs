// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events stream gateway.
//!
//! `GET /v1/events` converts one bus subscription into a long-lived push
//! connection: an immediate `connected` sentinel frame, a keepalive
//! comment every 15 seconds of silence, and one frame per matching
//! event. The subscription handle lives inside the response stream, so
//! client disconnect drops the stream and the `Drop` impl unsubscribes.
//! A broken pipe affects only its own connection.
//!
//! There is no replay: callers fetch a snapshot first, then subscribe.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use switchboard_bus::EventFilter;
use switchboard_core::{ChatbotId, ConversationId, Event};

use crate::auth::Identity;
use crate::server::GatewayState;

/// Scope parameters for the event stream. The organization always comes
/// from the authenticated identity.
#[derive(Debug, Default, Deserialize)]
pub struct EventStreamParams {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub chatbot_id: Option<String>,
}

/// Build the wire frame for one event: `event: <type>` plus the JSON
/// `{type, payload, emitted_at}` body.
fn event_frame(event: &Event) -> Option<SseEvent> {
    let data = serde_json::to_string(event).ok()?;
    Some(SseEvent::default().event(event.payload.kind()).data(data))
}

/// GET /v1/events
pub async fn stream_events(
    State(state): State<GatewayState>,
    identity: Identity,
    Query(params): Query<EventStreamParams>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let mut filter = EventFilter::organization(identity.organization_id.clone());
    if let Some(conversation) = params.conversation_id {
        filter = filter.with_conversation(ConversationId(conversation));
    }
    if let Some(chatbot) = params.chatbot_id {
        filter = filter.with_chatbot(ChatbotId(chatbot));
    }

    let subscription = state.bus.subscribe(filter);
    debug!(
        subscriber = subscription.id(),
        organization = %identity.organization_id,
        "event stream opened"
    );

    // The sentinel carries no state: dashboards fetch their snapshot
    // before subscribing.
    let connected = SseEvent::default().event("connected").data("{}");
    let events = stream::once(async move { Ok::<_, Infallible>(connected) }).chain(
        subscription.filter_map(|event| async move { event_frame(&event).map(Ok) }),
    );

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(state.keepalive)
            .text("keep-alive"),
    )
}
