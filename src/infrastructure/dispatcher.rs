//! Event Dispatcher
//!
//! Application-owned subscriber registry. Each subscriber gets its own
//! unbounded channel; publishing never blocks.

use crate::domain::models::CubeEvent;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
pub struct Dispatcher {
    subscribers: Vec<(SubscriptionId, mpsc::UnboundedSender<CubeEvent>)>,
    next_id: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> (SubscriptionId, mpsc::UnboundedReceiver<CubeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, tx));
        (id, rx)
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Send `event` to every live subscriber, dropping those whose receiver
    /// is gone. Returns true if at least one subscriber received it.
    pub fn publish(&mut self, event: CubeEvent) -> bool {
        self.subscribers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        trace!(
            "Published {:?} to {} subscribers",
            event,
            self.subscribers.len()
        );
        !self.subscribers.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let mut dispatcher = Dispatcher::new();
        let (_, mut a) = dispatcher.subscribe();
        let (_, mut b) = dispatcher.subscribe();

        assert!(dispatcher.publish(CubeEvent::Disconnected));
        assert_eq!(a.try_recv().unwrap(), CubeEvent::Disconnected);
        assert_eq!(b.try_recv().unwrap(), CubeEvent::Disconnected);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.publish(CubeEvent::BatteryChanged { level: 10 }));
    }

    #[test]
    fn test_unsubscribe() {
        let mut dispatcher = Dispatcher::new();
        let (id, mut rx) = dispatcher.subscribe();
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));

        assert!(!dispatcher.publish(CubeEvent::Disconnected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receivers_are_pruned() {
        let mut dispatcher = Dispatcher::new();
        let (_, rx) = dispatcher.subscribe();
        let (_, mut kept) = dispatcher.subscribe();
        drop(rx);

        assert!(dispatcher.publish(CubeEvent::Disconnected));
        assert_eq!(dispatcher.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), CubeEvent::Disconnected);
    }
}
