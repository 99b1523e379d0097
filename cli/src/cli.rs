use std::path::PathBuf;

use adapters::ccc::WireFormat;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use engine::FeedConfig;

pub const DEFAULT_STREAMER_URL: &str = "wss://streamer.cryptocompare.com/v2";

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatCli {
    Packed,
    Json,
}

impl From<FormatCli> for WireFormat {
    fn from(f: FormatCli) -> Self {
        match f {
            FormatCli::Packed => WireFormat::Packed,
            FormatCli::Json => WireFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "tradefeed", version)]
pub struct Cli {
    /// JSON feed config (`{"exchanges": {"Binance": {"trade": ["BTC/USD"]}}}`)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Extra pair to track, as `exchange:BASE/QUOTE` (repeatable)
    #[clap(long = "pair")]
    pub pairs: Vec<String>,

    /// Streamer WebSocket endpoint
    #[clap(long, default_value = DEFAULT_STREAMER_URL)]
    pub url: String,

    #[clap(long, value_enum, default_value_t = FormatCli::Packed)]
    pub format: FormatCli,

    /// Overrides `warmup_skip` from the config file
    #[clap(long)]
    pub warmup_skip: Option<u32>,

    /// Delay between reconnect attempts
    #[clap(long, default_value = "3")]
    pub reconnect_secs: u64,

    /// Log one JSON object per line
    #[clap(long)]
    pub json_logs: bool,
}

/// Split `exchange:BASE/QUOTE`. The pair itself is validated later with the
/// rest of the config.
pub(crate) fn parse_pair_arg(raw: &str) -> anyhow::Result<(&str, &str)> {
    let (exchange, pair) = raw
        .split_once(':')
        .with_context(|| format!("pair `{raw}` must look like exchange:BASE/QUOTE"))?;
    Ok((exchange.trim(), pair.trim()))
}

/// Config file (if any) plus `--pair` entries plus overrides.
pub(crate) fn build_config(cli: &Cli) -> anyhow::Result<FeedConfig> {
    let mut cfg = match &cli.config {
        Some(path) => FeedConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FeedConfig::default(),
    };

    for raw in &cli.pairs {
        let (exchange, pair) = parse_pair_arg(raw)?;
        cfg = cfg.with_pair(exchange, pair);
    }

    if let Some(skip) = cli.warmup_skip {
        cfg = cfg.with_warmup_skip(skip);
    }

    anyhow::ensure!(
        cfg.exchanges.iter().any(|(_, e)| !e.trade.is_empty()),
        "no pairs configured; pass --config or --pair"
    );
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("tradefeed").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.url, DEFAULT_STREAMER_URL);
        assert_eq!(cli.format, FormatCli::Packed);
        assert_eq!(cli.reconnect_secs, 3);
        assert!(cli.pairs.is_empty());
        assert!(!cli.json_logs);
    }

    #[test]
    fn pairs_build_a_config() {
        let cli = parse(&[
            "--pair",
            "binance:BTC/USD",
            "--pair",
            "kraken:ETH/EUR",
            "--warmup-skip",
            "0",
            "--format",
            "json",
        ]);

        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.warmup_skip, 0);
        assert_eq!(cfg.exchange("binance").unwrap().trade, vec!["BTC/USD"]);
        assert_eq!(cfg.exchange("kraken").unwrap().trade, vec!["ETH/EUR"]);
        assert_eq!(WireFormat::from(cli.format), WireFormat::Json);
    }

    #[test]
    fn pair_without_exchange_is_rejected() {
        assert!(parse_pair_arg("BTC/USD").is_err());
        assert_eq!(parse_pair_arg(" binance : BTC/USD").unwrap(), ("binance", "BTC/USD"));
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(build_config(&parse(&[])).is_err());
    }
}
