use std::collections::HashMap;
use std::sync::Arc;

use corelib::Emission;
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::topic::{Topic, fan_out_topics};

/// A thread-safe callback receiving every emission on its topic.
pub type EventHandler = Arc<dyn Fn(&Arc<Emission>) + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
enum Subscriber {
    Handler(EventHandler),
    /// Dropped from the table once its receiver is gone.
    Channel(UnboundedSender<Arc<Emission>>),
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    /// Subscribers per topic, in registration order.
    handlers: HashMap<Topic, Vec<(SubscriptionId, Subscriber)>>,
}

/// Topic-addressed subscriber registry.
///
/// Cloning yields another handle on the same table, so consumers can attach
/// while the feed task is publishing.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<RwLock<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: impl Into<Topic>, handler: F) -> SubscriptionId
    where
        F: Fn(&Arc<Emission>) + Send + Sync + 'static,
    {
        self.attach(topic.into(), Subscriber::Handler(Arc::new(handler)))
    }

    /// Subscribe through an unbounded channel, for async consumers.
    ///
    /// The subscription is removed by the first publish after the receiver is
    /// dropped.
    pub fn subscribe_channel(
        &self,
        topic: impl Into<Topic>,
    ) -> (SubscriptionId, UnboundedReceiver<Arc<Emission>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.attach(topic.into(), Subscriber::Channel(tx));
        (id, rx)
    }

    fn attach(&self, topic: Topic, subscriber: Subscriber) -> SubscriptionId {
        let mut inner = self.inner.write();

        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);

        debug!(topic = %topic, ?id, "subscriber attached");
        inner.handlers.entry(topic).or_default().push((id, subscriber));
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        let mut removed = false;

        inner.handlers.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(sid, _)| *sid != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    pub fn subscriber_count(&self, topic: impl Into<Topic>) -> usize {
        self.inner
            .read()
            .handlers
            .get(&topic.into())
            .map_or(0, Vec::len)
    }

    /// Deliver `emission` on each of its fan-out topics.
    ///
    /// Handlers run without the table lock held, so a handler may subscribe or
    /// unsubscribe. A panicking handler is logged and skipped.
    pub fn publish(&self, emission: Emission) {
        let emission = Arc::new(emission);
        let mut closed = Vec::new();

        for topic in fan_out_topics(&emission.info) {
            let subscribers = match self.inner.read().handlers.get(&topic) {
                Some(subscribers) => subscribers.clone(),
                None => continue,
            };

            for (id, subscriber) in subscribers {
                match subscriber {
                    Subscriber::Handler(handler) => {
                        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler(&emission);
                        }));

                        if result.is_err() {
                            error!(topic = %topic, event = %emission.info.event, "subscriber panicked");
                        }
                    }
                    Subscriber::Channel(tx) => {
                        if tx.send(Arc::clone(&emission)).is_err() {
                            closed.push(id);
                        }
                    }
                }
            }
        }

        for id in closed {
            debug!(?id, "channel receiver dropped, detaching");
            self.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use corelib::{EventKind, NormalizedTrade};

    use super::*;

    fn trade_emission() -> Emission {
        let trade = NormalizedTrade {
            price: 100.0,
            signed_quantity: 1.0,
            timestamp: 1,
            received_at: 2,
        };
        Emission::trades(EventKind::Trade, "binance", "BTC/USD", Arc::from(vec![trade]))
    }

    fn recorder(bus: &EventBus, topic: &str, log: &Arc<Mutex<Vec<String>>>) {
        let log = Arc::clone(log);
        let label = topic.to_string();
        bus.subscribe(topic, move |_| log.lock().unwrap().push(label.clone()));
    }

    #[test]
    fn publishes_most_specific_topic_first() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(vec![]));

        for topic in ["any", "trade:*:*", "trade:binance:*", "trade:binance:BTC/USD"] {
            recorder(&bus, topic, &log);
        }

        bus.publish(trade_emission());

        assert_eq!(
            *log.lock().unwrap(),
            vec!["trade:binance:BTC/USD", "trade:binance:*", "trade:*:*", "any"]
        );
    }

    #[test]
    fn unrelated_topics_are_not_called() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(vec![]));

        recorder(&bus, "trade:kraken:*", &log);
        recorder(&bus, "trade-realtime:*:*", &log);
        recorder(&bus, "open:binance", &log);

        bus.publish(trade_emission());

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(vec![]));

        let id = bus.subscribe("any", |_| {});
        recorder(&bus, "any", &log);
        assert_eq!(bus.subscriber_count("any"), 2);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count("any"), 1);

        bus.publish(trade_emission());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn handler_panics_do_not_stop_other_handlers() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(vec![]));

        bus.subscribe("trade:binance:BTC/USD", |_| panic!("boom"));
        recorder(&bus, "trade:binance:BTC/USD", &log);
        recorder(&bus, "any", &log);

        bus.publish(trade_emission());

        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn handler_may_subscribe_during_publish() {
        let bus = EventBus::new();
        let inner = bus.clone();

        bus.subscribe("any", move |_| {
            inner.subscribe("any", |_| {});
        });

        bus.publish(trade_emission());
        assert_eq!(bus.subscriber_count("any"), 2);
    }

    #[test]
    fn dropped_channel_receiver_is_detached_on_publish() {
        let bus = EventBus::new();
        let (_, rx) = bus.subscribe_channel("any");
        let (_, _kept) = bus.subscribe_channel("any");
        assert_eq!(bus.subscriber_count("any"), 2);

        drop(rx);
        bus.publish(trade_emission());

        assert_eq!(bus.subscriber_count("any"), 1);
    }

    #[tokio::test]
    async fn channel_subscribers_share_one_emission() {
        let bus = EventBus::new();
        let (_, mut exact) = bus.subscribe_channel("trade:binance:BTC/USD");
        let (_, mut any) = bus.subscribe_channel(Topic::any());

        bus.publish(trade_emission());

        let a = exact.recv().await.unwrap();
        let b = any.recv().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.payload.trades()[0].price, 100.0);
    }
}
