use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("exchange name must not be empty")]
    EmptyExchange,

    #[error("symbol pair `{0}` must have the form BASE/QUOTE")]
    InvalidPair(String),
}

/// Identity of one trade channel: `(exchange, base, quote)`.
///
/// Exchange names are lowercase and currency codes uppercase, whatever the
/// caller passed in.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolKey {
    pub exchange: String,
    pub base: String,
    pub quote: String,
}

impl SymbolKey {
    pub fn new(exchange: &str, base: &str, quote: &str) -> Self {
        Self {
            exchange: exchange.trim().to_lowercase(),
            base: base.trim().to_uppercase(),
            quote: quote.trim().to_uppercase(),
        }
    }

    /// Parse a configured `BASE/QUOTE` pair for `exchange`.
    pub fn parse(exchange: &str, pair: &str) -> Result<Self, SymbolError> {
        if exchange.trim().is_empty() {
            return Err(SymbolError::EmptyExchange);
        }

        let parts: Vec<&str> = pair.trim().split('/').map(str::trim).collect();
        match parts.as_slice() {
            [base, quote] if !base.is_empty() && !quote.is_empty() => {
                Ok(Self::new(exchange, base, quote))
            }
            _ => Err(SymbolError::InvalidPair(pair.to_string())),
        }
    }

    /// `BASE/QUOTE`, the symbol component of trade topics.
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.exchange, self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_case() {
        let k = SymbolKey::new("Binance", "btc", "usd");
        assert_eq!(k.exchange, "binance");
        assert_eq!(k.symbol(), "BTC/USD");
        assert_eq!(k.to_string(), "binance:BTC/USD");
    }

    #[test]
    fn parse_accepts_exactly_two_parts() {
        assert_eq!(
            SymbolKey::parse("Kraken", " eth/usd ").unwrap(),
            SymbolKey::new("kraken", "ETH", "USD")
        );

        for bad in ["BTC", "BTC/USD/EUR", "/USD", "BTC/", ""] {
            assert_eq!(
                SymbolKey::parse("kraken", bad),
                Err(SymbolError::InvalidPair(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn parse_rejects_blank_exchange() {
        assert_eq!(
            SymbolKey::parse("  ", "BTC/USD"),
            Err(SymbolError::EmptyExchange)
        );
    }
}
