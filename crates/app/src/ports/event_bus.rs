//! Event bus port: publish events to subscribers.

use owlhub_domain::event::Event;

/// Publishes events to interested subscribers.
///
/// Publishing never blocks and never fails from the caller's point of view:
/// delivery is best-effort.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event);
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) {
        (**self).publish(event);
    }
}
