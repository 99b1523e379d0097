//! Fan-out addressing.
//!
//! Each emission is published on several topics at once so subscribers can
//! pick their granularity:
//!
//! ```text
//! trade:binance:BTC/USD   exact symbol
//! trade:binance:*         every symbol on one exchange
//! trade:*:*               one event type everywhere
//! any                     everything, lifecycle included
//! ```
//!
//! Lifecycle events (`open`, `close`) have no symbol tier: `open:binance`,
//! `open:*`, `any`.

use std::fmt;

use corelib::{EventInfo, EventKind};

pub const ANY: &str = "any";
pub const WILDCARD: &str = "*";

/// A subscription address.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Topic(String);

impl Topic {
    /// One symbol on one exchange. For lifecycle kinds the symbol is ignored
    /// and this is the same as [`Topic::exchange`].
    pub fn exact(event: EventKind, exchange: &str, symbol: &str) -> Self {
        if event.is_lifecycle() {
            return Self::exchange(event, exchange);
        }
        Self(format!(
            "{event}:{}:{}",
            exchange.trim().to_lowercase(),
            symbol.trim().to_uppercase()
        ))
    }

    /// Every emission of `event` for one exchange.
    pub fn exchange(event: EventKind, exchange: &str) -> Self {
        let exchange = exchange.trim().to_lowercase();
        if event.is_lifecycle() {
            Self(format!("{event}:{exchange}"))
        } else {
            Self(format!("{event}:{exchange}:{WILDCARD}"))
        }
    }

    /// Every emission of `event` on every exchange.
    pub fn event(event: EventKind) -> Self {
        if event.is_lifecycle() {
            Self(format!("{event}:{WILDCARD}"))
        } else {
            Self(format!("{event}:{WILDCARD}:{WILDCARD}"))
        }
    }

    pub fn any() -> Self {
        Self(ANY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Topic {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// All topics an emission is published on, most specific first.
pub fn fan_out_topics(info: &EventInfo) -> Vec<Topic> {
    let event = info.event;
    let exchange = info.exchange.as_str();

    match info.symbol.as_deref() {
        Some(symbol) => vec![
            Topic(format!("{event}:{exchange}:{symbol}")),
            Topic(format!("{event}:{exchange}:{WILDCARD}")),
            Topic(format!("{event}:{WILDCARD}:{WILDCARD}")),
            Topic::any(),
        ],
        None => vec![
            Topic(format!("{event}:{exchange}")),
            Topic(format!("{event}:{WILDCARD}")),
            Topic::any(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(topics: Vec<Topic>) -> Vec<String> {
        topics.into_iter().map(|t| t.0).collect()
    }

    #[test]
    fn trade_fans_out_to_four_topics() {
        let info = EventInfo {
            event: EventKind::Trade,
            exchange: "binance".into(),
            symbol: Some("BTC/USD".into()),
        };

        assert_eq!(
            strings(fan_out_topics(&info)),
            vec![
                "trade:binance:BTC/USD",
                "trade:binance:*",
                "trade:*:*",
                "any"
            ]
        );
    }

    #[test]
    fn lifecycle_has_no_symbol_tier() {
        let info = EventInfo {
            event: EventKind::Close,
            exchange: "kraken".into(),
            symbol: None,
        };

        assert_eq!(
            strings(fan_out_topics(&info)),
            vec!["close:kraken", "close:*", "any"]
        );
    }

    #[test]
    fn realtime_topics_use_wire_name() {
        assert_eq!(
            Topic::exact(EventKind::TradeRealtime, "Binance", "btc/usd").as_str(),
            "trade-realtime:binance:BTC/USD"
        );
    }

    #[test]
    fn builders_match_fan_out_shapes() {
        assert_eq!(Topic::exchange(EventKind::Trade, "BINANCE").as_str(), "trade:binance:*");
        assert_eq!(Topic::event(EventKind::Trade).as_str(), "trade:*:*");
        assert_eq!(Topic::exchange(EventKind::Open, "Binance").as_str(), "open:binance");
        assert_eq!(Topic::event(EventKind::Open).as_str(), "open:*");
        assert_eq!(Topic::exact(EventKind::Open, "binance", "BTC/USD").as_str(), "open:binance");
        assert_eq!(Topic::from("any"), Topic::any());
    }
}
