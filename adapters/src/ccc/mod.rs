//! CryptoCompare-style streamer collaborator.
//!
//! The streamer multiplexes many exchanges over one connection. Trades arrive
//! either as packed `~`-separated frames or as JSON objects, and are
//! subscribed to with `0~{Exchange}~{FROM}~{TO}` topics.

pub mod parser;
pub mod subscription;
pub mod ws;

use async_trait::async_trait;
use corelib::{TickSide, TransportEvent};
use tokio::sync::mpsc::Sender;

pub use parser::{JsonTradeDecoder, PackedTradeDecoder, WireFormat};
pub use subscription::{subscribe_request, trade_subscription};
pub use ws::StreamerWsClient;

/// Message type prefix of trade frames.
pub const TRADE_TYPE: &str = "0";

pub const FLAG_BUY: u64 = 0x1;
pub const FLAG_SELL: u64 = 0x2;
pub const FLAG_UNKNOWN: u64 = 0x4;

pub fn side_from_flag(flag: u64) -> TickSide {
    match flag {
        FLAG_BUY => TickSide::Buy,
        FLAG_SELL => TickSide::Sell,
        _ => TickSide::Unknown,
    }
}

/// A connection that surfaces lifecycle and raw frames to the feed.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Stream until the receiving side of `sender` is dropped.
    async fn stream(&self, subs: Vec<String>, sender: Sender<TransportEvent>) -> anyhow::Result<()>;
}
