//! Dispatch Registry
//!
//! Owns one [`TradeChannel`] per configured symbol, routes decoded ticks to
//! them and forwards transport lifecycle. The channel set is built once from
//! [`FeedConfig`] and never resized: channels live in an arena in config order,
//! looked up through a key index.
//!
//! All mutation goes through `&mut self` on a single task; the only shared
//! state is the subscriber table inside [`EventBus`].

use std::collections::HashMap;
use std::sync::Arc;

use corelib::{Emission, NormalizedTrade, SymbolKey, TickInput};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::bus::{EventBus, SubscriptionId};
use crate::channel::{TickOutcome, TradeChannel};
use crate::clock::{Clock, SystemClock};
use crate::config::FeedConfig;
use crate::counters::{CountersSnapshot, FeedCounters};
use crate::error::ConfigError;
use crate::normalizer::Rejection;
use crate::topic::Topic;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    /// No channel is configured for the tick's symbol.
    Unrouted,
    Rejected(Rejection),
    Published(NormalizedTrade),
}

pub struct TradeRegistry {
    channels: Vec<TradeChannel>,
    index: HashMap<SymbolKey, usize>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    counters: FeedCounters,
}

impl TradeRegistry {
    pub fn new(config: &FeedConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &FeedConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let keys = config.symbol_keys()?;

        let index = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), i))
            .collect();
        let channels = keys
            .into_iter()
            .map(|key| TradeChannel::new(key, config.warmup_skip))
            .collect::<Vec<_>>();

        info!(channels = channels.len(), warmup_skip = config.warmup_skip, "trade registry built");

        Ok(Self {
            channels,
            index,
            bus: EventBus::new(),
            clock,
            counters: FeedCounters::default(),
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe<F>(&self, topic: impl Into<Topic>, handler: F) -> SubscriptionId
    where
        F: Fn(&Arc<Emission>) + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, handler)
    }

    pub fn subscribe_channel(
        &self,
        topic: impl Into<Topic>,
    ) -> (SubscriptionId, UnboundedReceiver<Arc<Emission>>) {
        self.bus.subscribe_channel(topic)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn counters(&self) -> &FeedCounters {
        &self.counters
    }

    pub fn stats(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SymbolKey> {
        self.channels.iter().map(TradeChannel::key)
    }

    pub fn channel(&self, key: &SymbolKey) -> Option<&TradeChannel> {
        self.index.get(key).map(|&i| &self.channels[i])
    }

    pub fn route_tick(&mut self, tick: TickInput) -> RouteOutcome {
        let key = SymbolKey::new(&tick.exchange, &tick.base, &tick.quote);

        let Some(&slot) = self.index.get(&key) else {
            FeedCounters::bump(&self.counters.ticks_unrouted);
            debug!(%key, "no channel for tick, dropped");
            return RouteOutcome::Unrouted;
        };
        FeedCounters::bump(&self.counters.ticks_routed);

        let now_ms = self.clock.now_ms();
        match self.channels[slot].accept_tick(&tick, now_ms, &self.bus) {
            TickOutcome::Published(trade) => {
                FeedCounters::bump(&self.counters.trades_published);
                RouteOutcome::Published(trade)
            }
            TickOutcome::Rejected(reason) => {
                let counter = match reason {
                    Rejection::Stale => &self.counters.rejected_stale,
                    Rejection::WarmUp => &self.counters.rejected_warmup,
                };
                FeedCounters::bump(counter);
                RouteOutcome::Rejected(reason)
            }
        }
    }

    /// Channels stay closed until their next accepted trade.
    pub fn on_transport_connected(&self) {
        info!(channels = self.channels.len(), "transport connected");
    }

    pub fn on_transport_disconnect(&mut self) {
        FeedCounters::bump(&self.counters.disconnects);

        let closed = self
            .channels
            .iter_mut()
            .map(|channel| channel.close(&self.bus))
            .filter(|changed| *changed)
            .count();

        info!(closed, "transport disconnected, channels closed");
    }
}
