use std::collections::HashSet;
use std::path::Path;

use corelib::SymbolKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::normalizer::DEFAULT_WARMUP_SKIP;

/// Symbols to track, per exchange.
///
/// ```json
/// { "warmup_skip": 2, "exchanges": { "Binance": { "trade": ["BTC/USD"] } } }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Normalizer warm-up calls discarded per symbol.
    #[serde(default = "default_warmup_skip")]
    pub warmup_skip: u32,

    /// Exchanges in file order; channels are built and closed in this order.
    #[serde(default, with = "ordered_map")]
    pub exchanges: Vec<(String, ExchangeConfig)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// `BASE/QUOTE` pairs whose trades are normalized.
    #[serde(default)]
    pub trade: Vec<String>,
}

fn default_warmup_skip() -> u32 {
    DEFAULT_WARMUP_SKIP
}

/// JSON object <-> ordered entry list, keeping the file's key order.
mod ordered_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(entries: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<Vec<(K, V)>, D::Error>
    where
        K: Deserialize<'de>,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<K, V>(std::marker::PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for EntriesVisitor<K, V>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = Vec<(K, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(std::marker::PhantomData))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            warmup_skip: DEFAULT_WARMUP_SKIP,
            exchanges: Vec::new(),
        }
    }
}

impl FeedConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_pair(mut self, exchange: &str, pair: &str) -> Self {
        let slot = match self.exchanges.iter().position(|(name, _)| name == exchange) {
            Some(i) => i,
            None => {
                self.exchanges.push((exchange.to_string(), ExchangeConfig::default()));
                self.exchanges.len() - 1
            }
        };
        self.exchanges[slot].1.trade.push(pair.to_string());
        self
    }

    pub fn exchange(&self, name: &str) -> Option<&ExchangeConfig> {
        self.exchanges
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cfg)| cfg)
    }

    pub fn with_warmup_skip(mut self, skip: u32) -> Self {
        self.warmup_skip = skip;
        self
    }

    /// Validate every pair and return the channel keys in a stable order.
    ///
    /// Entries that normalize to an existing key (`Binance` vs `binance`,
    /// `btc/usd` vs `BTC/USD`) are dropped with a warning.
    pub fn symbol_keys(&self) -> Result<Vec<SymbolKey>, ConfigError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for (exchange, cfg) in &self.exchanges {
            for pair in &cfg.trade {
                let key = SymbolKey::parse(exchange, pair).map_err(|source| {
                    ConfigError::InvalidSymbol {
                        exchange: exchange.clone(),
                        source,
                    }
                })?;

                if seen.insert(key.clone()) {
                    keys.push(key);
                } else {
                    warn!(%key, "duplicate symbol in config ignored");
                }
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use corelib::SymbolError;

    use super::*;

    #[test]
    fn parses_exchange_map_with_defaults() {
        let cfg = FeedConfig::from_json_str(
            r#"{ "exchanges": { "Binance": { "trade": ["btc/usd", "ETH/USD"] }, "Kraken": {} } }"#,
        )
        .unwrap();

        assert_eq!(cfg.warmup_skip, DEFAULT_WARMUP_SKIP);
        assert_eq!(
            cfg.symbol_keys().unwrap(),
            vec![
                SymbolKey::new("binance", "BTC", "USD"),
                SymbolKey::new("binance", "ETH", "USD"),
            ]
        );
    }

    #[test]
    fn keys_follow_file_order() {
        let cfg = FeedConfig::from_json_str(
            r#"{ "exchanges": { "Kraken": { "trade": ["ETH/USD"] }, "Binance": { "trade": ["BTC/USD"] } } }"#,
        )
        .unwrap();

        assert_eq!(
            cfg.symbol_keys().unwrap(),
            vec![
                SymbolKey::new("kraken", "ETH", "USD"),
                SymbolKey::new("binance", "BTC", "USD"),
            ]
        );

        let round_trip = FeedConfig::from_json_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(round_trip, cfg);
    }

    #[test]
    fn with_pair_appends_to_existing_exchange() {
        let cfg = FeedConfig::default()
            .with_pair("kraken", "ETH/USD")
            .with_pair("binance", "BTC/USD")
            .with_pair("kraken", "XBT/EUR");

        assert_eq!(cfg.exchanges.len(), 2);
        assert_eq!(cfg.exchanges[0].0, "kraken");
        assert_eq!(cfg.exchange("kraken").unwrap().trade, vec!["ETH/USD", "XBT/EUR"]);
        assert!(cfg.exchange("coinbase").is_none());
    }

    #[test]
    fn malformed_pair_fails_at_construction() {
        let cfg = FeedConfig::default().with_pair("binance", "BTCUSD");

        match cfg.symbol_keys() {
            Err(ConfigError::InvalidSymbol { exchange, source }) => {
                assert_eq!(exchange, "binance");
                assert_eq!(source, SymbolError::InvalidPair("BTCUSD".into()));
            }
            other => panic!("expected InvalidSymbol, got {other:?}"),
        }
    }

    #[test]
    fn case_variants_collapse_to_one_key() {
        let cfg = FeedConfig::default()
            .with_pair("Binance", "BTC/USD")
            .with_pair("binance", "btc/usd");

        assert_eq!(cfg.symbol_keys().unwrap().len(), 1);
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            FeedConfig::from_json_str("{ exchanges"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            FeedConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
