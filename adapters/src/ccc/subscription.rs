use corelib::SymbolKey;
use serde_json::{Value, json};

use super::TRADE_TYPE;

/// Streamer topic for one symbol's trades, e.g. `0~Binance~BTC~USD`.
///
/// The streamer matches exchange names case-sensitively with a leading capital.
pub fn trade_subscription(key: &SymbolKey) -> String {
    format!(
        "{TRADE_TYPE}~{}~{}~{}",
        capitalize(&key.exchange),
        key.base,
        key.quote
    )
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The `SubAdd` request sent once per connection.
pub fn subscribe_request(subs: &[String]) -> Value {
    json!({
        "action": "SubAdd",
        "subs": subs,
    })
}
