//! # Publishing
//!
//! The lifecycle service calls [`EventPublisher::publish`] after its unit of
//! work has committed, so publishing can neither fail nor roll anything back.

use crate::events::{DomainEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Outbound port for committed events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hand `event` to every current subscriber; returns how many there were.
    async fn publish(&self, event: DomainEvent) -> usize;

    /// Events handed to `publish` since start, delivered or not.
    fn events_published(&self) -> u64;
}

/// Single-process bus over `tokio::sync::broadcast`.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<DomainEvent>,
    capacity: usize,
    published: AtomicU64,
    unheard: AtomicU64,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` events are buffered per subscriber before it lags.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            capacity: capacity.max(1),
            published: AtomicU64::new(0),
            unheard: AtomicU64::new(0),
        }
    }

    /// Events published after this call that match `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "Subscription opened");
        Subscription::new(self.sender.subscribe(), filter)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published while nobody was subscribed.
    pub fn events_dropped(&self) -> u64 {
        self.unheard.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        let submission_id = event.submission().map(|s| s.id);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(?topic, ?submission_id, receivers, "Event published");
                receivers
            }
            Err(_) => {
                self.unheard.fetch_add(1, Ordering::Relaxed);
                warn!(?topic, ?submission_id, "Event published with no subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
