use serde::{Deserialize, Serialize};

pub mod event;
pub mod symbol;
pub mod transport;

pub use event::{Emission, EventInfo, EventKind, EventPayload};
pub use symbol::{SymbolError, SymbolKey};
pub use transport::{DecodeError, TickDecoder, TransportEvent};

/// Aggressor side of an executed trade.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    #[default]
    Buy,

    Sell,
}

impl TradeSide {
    /// Apply the sign convention: buys are positive, sells negative.
    pub fn signed(self, quantity: f64) -> f64 {
        match self {
            TradeSide::Buy => quantity.abs(),
            TradeSide::Sell => -quantity.abs(),
        }
    }
}

/// Side flag as reported by a feed, which may not classify the trade.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TickSide {
    Buy,
    Sell,

    #[default]
    Unknown,
}

impl TickSide {
    pub fn known(self) -> Option<TradeSide> {
        match self {
            TickSide::Buy => Some(TradeSide::Buy),
            TickSide::Sell => Some(TradeSide::Sell),
            TickSide::Unknown => None,
        }
    }
}

/// A decoded trade tick, exactly as the wire decoder produced it.
///
/// `exchange`, `base` and `quote` are not case-normalized yet; the registry
/// does that when it resolves the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    pub exchange: String,
    pub base: String,
    pub quote: String,
    pub price: f64,
    /// Unsigned trade size.
    pub quantity: f64,
    pub server_time_ms: i64,
    pub side: TickSide,
}

/// A trade after side classification and timestamp correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedTrade {
    pub price: f64,
    /// Positive for buys, negative for sells.
    pub signed_quantity: f64,
    /// Server time re-anchored onto the local clock, in milliseconds.
    pub timestamp: i64,
    /// Local wall-clock when the tick was processed, in milliseconds.
    pub received_at: i64,
}

impl NormalizedTrade {
    pub fn side(&self) -> TradeSide {
        if self.signed_quantity < 0.0 {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }
}
