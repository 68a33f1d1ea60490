//! In-memory fan-out bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak, mpsc};

use shipsync_core::WarehouseId;
use thiserror::Error;

use crate::bus::{EventBus, Subscription, SubscriptionId, WarehouseScoped, passes_filter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    #[error("subscriber registry lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct Subscriber<M> {
    id: SubscriptionId,
    filter: Option<WarehouseId>,
    sender: mpsc::Sender<M>,
}

type Registry<M> = Mutex<Vec<Subscriber<M>>>;

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - One unbounded queue per subscriber, so publishing never waits on a consumer
/// - Subscribers whose receiving end is gone are pruned on the next delivery attempt
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Arc<Registry<M>>,
    next_id: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

fn unregister<M>(registry: &Weak<Registry<M>>, id: SubscriptionId) {
    // The bus may already be gone; nothing to clean up then.
    let Some(registry) = registry.upgrade() else {
        return;
    };
    if let Ok(mut subs) = registry.lock() {
        subs.retain(|s| s.id != id);
        tracing::debug!(subscription = %id, remaining = subs.len(), "subscription detached");
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: WarehouseScoped + Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<usize, Self::Error> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        let mut delivered = 0;
        subs.retain(|sub| {
            if !passes_filter(sub.filter.as_ref(), &message) {
                return true;
            }
            match sub.sender.send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::warn!(subscription = %sub.id, "dropping disconnected subscriber");
                    false
                }
            }
        });

        Ok(delivered)
    }

    fn subscribe(&self, filter: Option<WarehouseId>) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber {
                id,
                filter: filter.clone(),
                sender: tx,
            });
        }
        tracing::debug!(subscription = %id, filter = ?filter, "subscription attached");

        let registry = Arc::downgrade(&self.subscribers);
        Subscription::new(id, filter, rx, move |id| unregister(&registry, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        warehouse: Option<&'static str>,
        n: u32,
    }

    impl WarehouseScoped for Note {
        fn concerns(&self, warehouse: &WarehouseId) -> bool {
            self.warehouse.is_none_or(|w| warehouse == w)
        }
    }

    fn note(warehouse: Option<&'static str>, n: u32) -> Note {
        Note { warehouse, n }
    }

    #[test]
    fn every_unfiltered_subscriber_gets_every_message_in_order() {
        let bus = InMemoryEventBus::new();
        let a = bus.subscribe(None);
        let b = bus.subscribe(None);

        for n in 0..5 {
            assert_eq!(bus.publish(note(Some("CHI"), n)).unwrap(), 2);
        }

        let seen_a: Vec<u32> = a.drain().into_iter().map(|m| m.n).collect();
        let seen_b: Vec<u32> = b.drain().into_iter().map(|m| m.n).collect();
        assert_eq!(seen_a, vec![0, 1, 2, 3, 4]);
        assert_eq!(seen_a, seen_b);
    }

    #[test]
    fn filters_apply_per_subscriber_and_globals_reach_all() {
        let bus = InMemoryEventBus::new();
        let chi = bus.subscribe(Some(WarehouseId::new("CHI")));
        let dal = bus.subscribe(Some(WarehouseId::new("DAL")));

        bus.publish(note(Some("CHI"), 1)).unwrap();
        bus.publish(note(Some("DAL"), 2)).unwrap();
        bus.publish(note(None, 3)).unwrap();

        assert_eq!(chi.drain(), vec![note(Some("CHI"), 1), note(None, 3)]);
        assert_eq!(dal.drain(), vec![note(Some("DAL"), 2), note(None, 3)]);
    }

    #[test]
    fn detached_subscriber_is_unregistered() {
        let bus = InMemoryEventBus::new();
        let keep = bus.subscribe(None);
        let gone = bus.subscribe(None);
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(note(None, 1)).unwrap();
        gone.detach();
        assert_eq!(bus.subscriber_count(), 1);

        assert_eq!(bus.publish(note(None, 2)).unwrap(), 1);
        assert_eq!(keep.drain().len(), 2);
    }

    #[test]
    fn dropping_a_subscription_detaches_it() {
        let bus: InMemoryEventBus<Note> = InMemoryEventBus::new();
        {
            let _sub = bus.subscribe(None);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(note(None, 1)).unwrap(), 0);
    }

    #[test]
    fn subscription_outliving_the_bus_detaches_quietly() {
        let bus: InMemoryEventBus<Note> = InMemoryEventBus::new();
        let sub = bus.subscribe(None);
        drop(bus);
        assert!(sub.try_recv().is_err());
        sub.detach();
    }

    #[test]
    fn slow_subscriber_does_not_block_publisher() {
        let bus = Arc::new(InMemoryEventBus::<Note>::new());
        let _idle = bus.subscribe(None);
        let fast = bus.subscribe(None);

        // Nobody reads `_idle`; publishing must still complete.
        for n in 0..10_000 {
            bus.publish(note(None, n)).unwrap();
        }
        assert_eq!(fast.drain().len(), 10_000);
    }

    #[test]
    fn detach_races_safely_with_publish() {
        let bus = Arc::new(InMemoryEventBus::<Note>::new());
        let observer = bus.subscribe(None);

        let publisher = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                for n in 0..1_000 {
                    bus.publish(note(None, n)).unwrap();
                }
            })
        };

        let _ = observer.recv_timeout(Duration::from_millis(50));
        observer.detach();
        publisher.join().unwrap();

        assert_eq!(bus.subscriber_count(), 0);
    }
}
