//! Trade Channel
//!
//! One channel per `(exchange, symbol)`. It owns the clock normalizer for that
//! symbol, the tick-rule state used to classify unsided trades, and an
//! open/closed lifecycle flag.
//!
//! ```text
//! Closed --(accepted trade)-------> Open     emits `open`
//! Open   --(transport disconnect)--> Closed  emits `close`
//! ```
//!
//! Re-entering the current state emits nothing.

use std::sync::Arc;

use corelib::{Emission, EventKind, NormalizedTrade, SymbolKey, TickInput, TradeSide};
use tracing::{debug, info};

use crate::bus::EventBus;
use crate::normalizer::{ClockNormalizer, Normalized, Rejection};

/// Classify a trade from price movement (the tick rule).
///
/// An uptick is a buy, a downtick a sell, and an unchanged price repeats the
/// previous classification.
pub fn infer_side(price: f64, prev_price: f64, prev_side: TradeSide) -> TradeSide {
    if price > prev_price {
        TradeSide::Buy
    } else if price < prev_price {
        TradeSide::Sell
    } else {
        prev_side
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Rejected(Rejection),
    Published(NormalizedTrade),
}

pub struct TradeChannel {
    key: SymbolKey,
    symbol: String,
    is_open: bool,
    prev_price: f64,
    prev_side: TradeSide,
    normalizer: ClockNormalizer,
}

impl TradeChannel {
    pub fn new(key: SymbolKey, warmup_skip: u32) -> Self {
        let symbol = key.symbol();
        Self {
            key,
            symbol,
            is_open: false,
            prev_price: 0.0,
            prev_side: TradeSide::Buy,
            normalizer: ClockNormalizer::new(warmup_skip),
        }
    }

    pub fn key(&self) -> &SymbolKey {
        &self.key
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn prev_price(&self) -> f64 {
        self.prev_price
    }

    pub fn prev_side(&self) -> TradeSide {
        self.prev_side
    }

    pub fn normalizer(&self) -> &ClockNormalizer {
        &self.normalizer
    }

    pub(crate) fn accept_tick(&mut self, tick: &TickInput, now_ms: i64, bus: &EventBus) -> TickOutcome {
        // Inference state tracks every unsided tick, including ones the
        // normalizer is about to drop.
        let side = match tick.side.known() {
            Some(side) => side,
            None => {
                let side = infer_side(tick.price, self.prev_price, self.prev_side);
                self.prev_price = tick.price;
                self.prev_side = side;
                side
            }
        };
        let signed_quantity = side.signed(tick.quantity);

        let timestamp = match self.normalizer.normalize(tick.server_time_ms, now_ms) {
            Normalized::Accepted(ts) => ts,
            Normalized::Rejected(reason) => {
                debug!(channel = %self.key, ?reason, server_time_ms = tick.server_time_ms, "tick rejected by normalizer");
                return TickOutcome::Rejected(reason);
            }
        };

        self.open(bus);

        let trade = NormalizedTrade {
            price: tick.price,
            signed_quantity,
            timestamp,
            received_at: now_ms,
        };
        let group: Arc<[NormalizedTrade]> = Arc::from(vec![trade]);

        for kind in [EventKind::Trade, EventKind::TradeRealtime] {
            bus.publish(Emission::trades(
                kind,
                &self.key.exchange,
                &self.symbol,
                Arc::clone(&group),
            ));
        }

        TickOutcome::Published(trade)
    }

    /// Returns `true` when this call changed the state.
    pub(crate) fn open(&mut self, bus: &EventBus) -> bool {
        if self.is_open {
            return false;
        }
        self.is_open = true;

        info!(channel = %self.key, "channel opened");
        bus.publish(Emission::lifecycle(EventKind::Open, &self.key.exchange));
        true
    }

    /// Returns `true` when this call changed the state.
    pub(crate) fn close(&mut self, bus: &EventBus) -> bool {
        if !self.is_open {
            return false;
        }
        self.is_open = false;

        info!(channel = %self.key, "channel closed");
        bus.publish(Emission::lifecycle(EventKind::Close, &self.key.exchange));
        true
    }
}
