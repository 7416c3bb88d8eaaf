//! # Notification Fan-out
//!
//! Consumes committed events from the bus and pushes one encoded frame to
//! every connection the event routes to.

use crate::channel::{route, Route};
use crate::errors::DeliveryFailure;
use crate::message::OutboundMessage;
use crate::registry::ConnectionRegistry;
use serde::Serialize;
use shared_bus::{DomainEvent, Subscription};
use shared_types::ConnectionId;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Fan-out counters.
#[derive(Debug, Default)]
pub struct FanoutStats {
    events_dispatched: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
    encode_failures: AtomicU64,
}

/// Point-in-time copy of [`FanoutStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanoutSnapshot {
    pub events_dispatched: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
    pub encode_failures: u64,
}

impl FanoutStats {
    pub fn snapshot(&self) -> FanoutSnapshot {
        FanoutSnapshot {
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of dispatching one event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Distinct connections the event routed to.
    pub targeted: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

pub struct NotificationFanout {
    registry: Arc<dyn ConnectionRegistry>,
    stats: Arc<FanoutStats>,
}

impl NotificationFanout {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            registry,
            stats: Arc::new(FanoutStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<FanoutStats> {
        self.stats.clone()
    }

    /// Distinct live connections an event routes to.
    pub fn recipients(&self, event: &DomainEvent) -> HashSet<ConnectionId> {
        match route(event) {
            Route::Broadcast => self.registry.all_connections().into_iter().collect(),
            Route::Channels(channels) => channels
                .iter()
                .flat_map(|channel| self.registry.members_of(channel))
                .collect(),
        }
    }

    /// Deliver one event. Failures are logged and counted, never returned
    /// as errors.
    pub fn dispatch(&self, event: &DomainEvent) -> DeliveryReport {
        self.stats.events_dispatched.fetch_add(1, Ordering::Relaxed);

        let message = OutboundMessage::from_event(event);
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.encode_failures.fetch_add(1, Ordering::Relaxed);
                error!(event = %message.event, error = %e, "Failed to encode event");
                return DeliveryReport::default();
            }
        };

        let recipients = self.recipients(event);
        let mut report = DeliveryReport {
            targeted: recipients.len(),
            ..DeliveryReport::default()
        };

        for id in recipients {
            match self.registry.deliver(&id, frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    warn!(connection_id = %id, error = %failure, "Delivery failed");
                    report.failures.push(failure);
                }
            }
        }

        self.stats
            .deliveries
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.stats
            .delivery_failures
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);

        debug!(
            event = %message.event,
            targeted = report.targeted,
            delivered = report.delivered,
            "Event fanned out"
        );
        report
    }

    /// Dispatch events from `subscription` until the bus closes or
    /// `shutdown` flips to `true`.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        info!("Notification fan-out started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = subscription.recv() => match event {
                    Some(event) => {
                        self.dispatch(&event);
                    }
                    None => break,
                },
            }
        }
        info!(lagged = subscription.lagged(), "Notification fan-out stopped");
    }

    pub fn spawn(
        self: Arc<Self>,
        subscription: Subscription,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(subscription, shutdown))
    }
}
