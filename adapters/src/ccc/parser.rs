//! Streamer trade decoders
//!
//! Two frame encodings carry the same trade fields:
//!
//! ```text
//! packed: 0~Binance~BTC~USD~1~123456~1700000000~0.25~37000~9250~3ff
//!         T M       FSYM TSYM F ID   TS(secs)   Q    P     TOTAL [mask]
//!
//! json:   {"TYPE":"0","M":"Binance","FSYM":"BTC","TSYM":"USD",
//!          "F":"1","ID":"123456","TS":1700000000,"Q":0.25,"P":37000}
//! ```
//!
//! Rules shared by both decoders:
//!
//! - frames of any other type decode to `Ok(None)`
//! - a trade with an empty / null / `NaN` / infinite price, quantity or
//!   timestamp decodes to `Ok(None)`; the feed drops those silently
//! - a trade frame missing its identity fields, or with a field that is present
//!   but not a number, is an `Err`
//! - `TS` is in seconds and is converted to milliseconds; a `TS` whose
//!   millisecond value does not fit an `i64` is an `Err`
//! - flag `1` is a buy, `2` a sell, anything else leaves the side unknown

use corelib::{DecodeError, TickDecoder, TickInput};
use serde::Deserialize;
use serde_json::Value;

use super::{TRADE_TYPE, side_from_flag};

const PACKED_FIELDS: [&str; 9] = ["TYPE", "M", "FSYM", "TSYM", "F", "ID", "TS", "Q", "P"];

fn parse_optional(field: &'static str, raw: &str) -> Result<Option<f64>, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let value = raw.parse::<f64>().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    Ok(value.is_finite().then_some(value))
}

fn parse_flag(raw: &str) -> u64 {
    u64::from_str_radix(raw.trim(), 16).unwrap_or(0)
}

fn seconds_to_ms(ts: f64) -> Result<i64, DecodeError> {
    let ms = (ts * 1_000.0).round();
    // `i64::MAX as f64` rounds up to 2^63, hence the exclusive upper bound
    if !(i64::MIN as f64..i64::MAX as f64).contains(&ms) {
        return Err(DecodeError::InvalidNumber {
            field: "TS",
            value: ts.to_string(),
        });
    }
    Ok(ms as i64)
}

/// Decoder for `~`-separated trade frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct PackedTradeDecoder;

impl TickDecoder for PackedTradeDecoder {
    fn decode(&self, raw: &str) -> Result<Option<TickInput>, DecodeError> {
        if !raw.starts_with(&format!("{TRADE_TYPE}~")) {
            return Ok(None);
        }

        let fields: Vec<&str> = raw.split('~').collect();
        if let Some(missing) = PACKED_FIELDS.get(fields.len()) {
            return Err(DecodeError::MissingField(*missing));
        }

        let price = parse_optional("P", fields[8])?;
        let quantity = parse_optional("Q", fields[7])?;
        let ts = parse_optional("TS", fields[6])?;

        let (Some(price), Some(quantity), Some(ts)) = (price, quantity, ts) else {
            return Ok(None);
        };

        Ok(Some(TickInput {
            exchange: fields[1].to_string(),
            base: fields[2].to_string(),
            quote: fields[3].to_string(),
            price,
            quantity,
            server_time_ms: seconds_to_ms(ts)?,
            side: side_from_flag(parse_flag(fields[4])),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct StreamerTrade {
    #[serde(rename = "M")]
    market: Option<String>,
    #[serde(rename = "FSYM")]
    from_symbol: Option<String>,
    #[serde(rename = "TSYM")]
    to_symbol: Option<String>,
    #[serde(rename = "F", default)]
    flag: Value,
    #[serde(rename = "TS", default)]
    ts: Value,
    #[serde(rename = "Q", default)]
    quantity: Value,
    #[serde(rename = "P", default)]
    price: Value,
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn json_number(field: &'static str, v: &Value) -> Result<Option<f64>, DecodeError> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite())),
        Value::String(s) => parse_optional(field, s),
        other => Err(DecodeError::InvalidNumber {
            field,
            value: other.to_string(),
        }),
    }
}

fn json_flag(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => parse_flag(s),
        _ => 0,
    }
}

/// Decoder for JSON trade objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTradeDecoder;

impl TickDecoder for JsonTradeDecoder {
    fn decode(&self, raw: &str) -> Result<Option<TickInput>, DecodeError> {
        let json: Value = serde_json::from_str(raw)?;

        let is_trade = match json.get("TYPE") {
            Some(Value::String(t)) => t == TRADE_TYPE,
            Some(Value::Number(n)) => n.as_u64() == Some(0),
            _ => false,
        };
        if !is_trade {
            return Ok(None);
        }

        let trade: StreamerTrade = serde_json::from_value(json)?;

        let exchange = trade.market.ok_or(DecodeError::MissingField("M"))?;
        let base = trade.from_symbol.ok_or(DecodeError::MissingField("FSYM"))?;
        let quote = trade.to_symbol.ok_or(DecodeError::MissingField("TSYM"))?;

        let price = json_number("P", &trade.price)?;
        let quantity = json_number("Q", &trade.quantity)?;
        let ts = json_number("TS", &trade.ts)?;

        let (Some(price), Some(quantity), Some(ts)) = (price, quantity, ts) else {
            return Ok(None);
        };

        Ok(Some(TickInput {
            exchange,
            base,
            quote,
            price,
            quantity,
            server_time_ms: seconds_to_ms(ts)?,
            side: side_from_flag(json_flag(&trade.flag)),
        }))
    }
}

/// Frame encoding selected at startup.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WireFormat {
    #[default]
    Packed,
    Json,
}

impl TickDecoder for WireFormat {
    fn decode(&self, raw: &str) -> Result<Option<TickInput>, DecodeError> {
        match self {
            WireFormat::Packed => PackedTradeDecoder.decode(raw),
            WireFormat::Json => JsonTradeDecoder.decode(raw),
        }
    }
}
