pub mod bus;
pub mod channel;
pub mod clock;
pub mod config;
pub mod counters;
pub mod dispatcher;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod topic;

pub use bus::{EventBus, EventHandler, SubscriptionId};
pub use channel::{TickOutcome, TradeChannel, infer_side};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ExchangeConfig, FeedConfig};
pub use counters::{CountersSnapshot, FeedCounters};
pub use dispatcher::FeedDispatcher;
pub use error::ConfigError;
pub use normalizer::{ClockNormalizer, DEFAULT_WARMUP_SKIP, Normalized, ReferencePair, Rejection};
pub use registry::{RouteOutcome, TradeRegistry};
pub use topic::{Topic, fan_out_topics};
