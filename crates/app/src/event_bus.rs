//! In-process event fan-out with an explicit subscriber registry.
//!
//! Every subscriber owns a bounded tokio [`mpsc`] queue. Publishing walks the
//! registry and uses `try_send`, so a slow subscriber loses events instead of
//! stalling ingestion; each subscriber still sees its events in publish order.
//! Subscribers whose receiving side was dropped are pruned on the next publish.
//!
//! The registry also keeps a [`Snapshot`] of the latest reading and of the
//! alert that is currently active, for subscribers that join late.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;

use owlhub_domain::alert::AnomalyAlert;
use owlhub_domain::event::Event;
use owlhub_domain::id::SubscriberId;
use owlhub_domain::telemetry::Telemetry;

use crate::ports::EventPublisher;

/// Current state visible to any subscriber at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Most recent calibrated reading.
    pub latest: Option<Telemetry>,
    /// Alert published and not yet cleared.
    pub active_alert: Option<AnomalyAlert>,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Event>>,
    snapshot: Snapshot,
    closed: bool,
}

/// Publish/subscribe hub for telemetry and alert events.
///
/// Designed to be shared via `Arc<EventFanout>`; registration and
/// unregistration are safe from any number of concurrent callers.
pub struct EventFanout {
    registry: Mutex<Registry>,
    capacity: usize,
}

/// Receiving side of one registration.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Event>,
}

impl Subscription {
    /// Handle to pass to [`EventFanout::unsubscribe`].
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event; `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Give up the handle and keep only the raw receiver.
    #[must_use]
    pub fn into_receiver(self) -> mpsc::Receiver<Event> {
        self.receiver
    }
}

impl EventFanout {
    /// Create a fan-out where each subscriber may queue up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber.
    ///
    /// The subscription receives every event published *after* this call.
    /// After [`close`](Self::close) the subscription ends immediately.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = SubscriberId::new();
        let mut registry = self.lock();
        if !registry.closed {
            registry.subscribers.insert(id, sender);
            tracing::debug!(subscriber = %id, "subscriber registered");
        }
        Subscription { id, receiver }
    }

    /// Drop every subscriber and refuse new ones.
    ///
    /// Each open subscription drains what is already queued and then ends.
    /// The snapshot keeps being updated by later publishes.
    pub fn close(&self) {
        let mut registry = self.lock();
        registry.closed = true;
        let dropped = registry.subscribers.len();
        registry.subscribers.clear();
        tracing::debug!(dropped, "event fan-out closed");
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().subscribers.remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "subscriber removed");
        }
        removed
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Latest reading and active alert.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventPublisher for EventFanout {
    fn publish(&self, event: Event) {
        let mut registry = self.lock();

        match &event {
            Event::Telemetry { reading } => registry.snapshot.latest = Some(*reading),
            Event::AnomalyAlert { alert } => registry.snapshot.active_alert = Some(alert.clone()),
            Event::AlertCleared { alert_id, .. } => {
                if registry
                    .snapshot
                    .active_alert
                    .as_ref()
                    .is_some_and(|active| active.id == *alert_id)
                {
                    registry.snapshot.active_alert = None;
                }
            }
        }

        let kind = event.kind();
        registry
            .subscribers
            .retain(|id, sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %id, kind, "subscriber queue full, event dropped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(subscriber = %id, "subscriber gone, removing");
                    false
                }
            });
    }
}
