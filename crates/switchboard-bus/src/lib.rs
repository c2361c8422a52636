// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process event bus with per-subscriber filtering.
//!
//! The bus is an explicitly constructed, injectable instance: the
//! application root builds one [`EventBus`] and hands clones to the
//! engine (publisher) and the gateway (subscriber). There is no global
//! emitter.
//!
//! Delivery semantics:
//! - `publish` fans out synchronously to every subscriber whose filter
//!   matches and never blocks on a slow consumer. Each subscriber owns a
//!   bounded buffer; a subscriber whose buffer is full is dropped (its
//!   channel closed) rather than allowed to backpressure the publisher.
//! - A subscriber sees matching events in publish order. There is no
//!   cross-subscriber ordering, no history, and no replay: connect after
//!   an event and you will never see it.
//! - [`Subscription`] unsubscribes in `Drop`, so cleanup is guaranteed on
//!   scope exit even when a connection handler unwinds.

mod filter;

pub use filter::EventFilter;

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use switchboard_core::Event;

/// Default per-subscriber buffer, in events.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

struct SubscriberSlot {
    filter: EventFilter,
    tx: mpsc::Sender<Event>,
}

struct BusInner {
    subscribers: DashMap<u64, SubscriberSlot>,
    next_id: AtomicU64,
    buffer: usize,
}

/// Cheap-to-clone handle to one bus instance.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus whose subscribers each buffer up to `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(1),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a subscriber. Only events matching `filter` are delivered.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        self.inner
            .subscribers
            .insert(id, SubscriberSlot { filter, tx });
        debug!(subscriber = id, "bus subscriber registered");
        Subscription {
            id,
            rx,
            bus: Arc::clone(&self.inner),
        }
    }

    /// Fan an event out to every matching subscriber.
    ///
    /// Returns the number of subscribers the event was delivered to.
    /// Publishing with zero matching subscribers is not an error.
    pub fn publish(&self, event: &Event) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for entry in self.inner.subscribers.iter() {
            if !entry.filter.matches(&event.payload) {
                continue;
            }
            match entry.tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        subscriber = *entry.key(),
                        kind = event.payload.kind(),
                        "subscriber buffer full, dropping subscriber"
                    );
                    evicted.push(*entry.key());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted.push(*entry.key());
                }
            }
        }

        // Removal happens outside the iteration to keep the shard locks
        // uncontended.
        for id in evicted {
            self.inner.subscribers.remove(&id);
        }

        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.subscribers.len())
            .field("buffer", &self.inner.buffer)
            .finish()
    }
}

/// A live subscription handle.
///
/// Receives matching events in publish order, implements [`Stream`], and
/// unsubscribes when dropped. After the bus evicts a slow subscriber the
/// handle drains whatever was already buffered and then ends.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Event>,
    bus: Arc<BusInner>,
}

impl Subscription {
    /// Opaque subscriber id, for diagnostics.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next matching event. Returns `None` once the
    /// subscription has been evicted and its buffer drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.subscribers.remove(&self.id);
        debug!(subscriber = self.id, "bus subscriber removed");
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
