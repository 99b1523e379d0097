use std::fmt;
use std::sync::Arc;

use super::NormalizedTrade;

/// Every event name the feed publishes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Trade,
    /// Same payload as `Trade`, on its own topic so consumers can treat the
    /// real-time feed differently from the full history feed.
    TradeRealtime,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Trade => "trade",
            EventKind::TradeRealtime => "trade-realtime",
        }
    }

    /// Lifecycle events are scoped to an exchange and carry no symbol.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, EventKind::Open | EventKind::Close)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing information delivered alongside each payload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EventInfo {
    pub event: EventKind,
    pub exchange: String,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Lifecycle,
    /// A trade group. The feed always publishes groups of one.
    Trades(Arc<[NormalizedTrade]>),
}

impl EventPayload {
    pub fn trades(&self) -> &[NormalizedTrade] {
        match self {
            EventPayload::Lifecycle => &[],
            EventPayload::Trades(group) => group,
        }
    }
}

/// One published event. Subscribers on every fan-out topic share the same
/// `Arc<Emission>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub info: EventInfo,
    pub payload: EventPayload,
}

impl Emission {
    pub fn lifecycle(event: EventKind, exchange: &str) -> Self {
        Self {
            info: EventInfo {
                event,
                exchange: exchange.to_string(),
                symbol: None,
            },
            payload: EventPayload::Lifecycle,
        }
    }

    pub fn trades(
        event: EventKind,
        exchange: &str,
        symbol: &str,
        group: Arc<[NormalizedTrade]>,
    ) -> Self {
        Self {
            info: EventInfo {
                event,
                exchange: exchange.to_string(),
                symbol: Some(symbol.to_string()),
            },
            payload: EventPayload::Trades(group),
        }
    }
}
