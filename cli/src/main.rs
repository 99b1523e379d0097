pub mod cli;

use std::time::Duration;

use adapters::ccc::{FeedTransport, StreamerWsClient, WireFormat, trade_subscription};
use clap::Parser;
use cli::*;
use common::logger::init_logger;
use corelib::EventPayload;
use engine::{FeedDispatcher, Topic, TradeRegistry};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("tradefeed", cli.json_logs);

    let cfg = build_config(&cli)?;
    let registry = TradeRegistry::new(&cfg)?;

    registry.subscribe(Topic::any(), |emission| match &emission.payload {
        EventPayload::Lifecycle => {
            info!(event = %emission.info.event, exchange = %emission.info.exchange, "lifecycle");
        }
        EventPayload::Trades(group) => {
            for trade in group.iter() {
                info!(
                    event = %emission.info.event,
                    exchange = %emission.info.exchange,
                    symbol = emission.info.symbol.as_deref().unwrap_or_default(),
                    price = trade.price,
                    quantity = trade.signed_quantity,
                    timestamp = trade.timestamp,
                    "trade"
                );
            }
        }
    });

    let subs: Vec<String> = registry.keys().map(trade_subscription).collect();
    info!(subs = ?subs, url = %cli.url, "starting feed");

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);

    let client = StreamerWsClient::new(cli.url.clone())
        .with_reconnect_delay(Duration::from_secs(cli.reconnect_secs));
    let mut transport = tokio::spawn(async move { client.stream(subs, event_tx).await });

    let decoder = WireFormat::from(cli.format);
    let dispatcher = tokio::spawn(FeedDispatcher::new(registry, decoder, event_rx).run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
        res = &mut transport => warn!(?res, "transport task ended"),
    }

    // dropping the transport's sender ends the dispatcher, which closes every channel
    transport.abort();
    let registry = match dispatcher.await {
        Ok(registry) => registry,
        Err(e) => anyhow::bail!("dispatcher task failed: {e}"),
    };
    info!(stats = ?registry.stats(), "feed stopped");

    Ok(())
}
