use std::sync::Arc;

use corelib::{DecodeError, EventKind, TickDecoder, TickInput, TickSide, TransportEvent};
use engine::{FeedConfig, FeedDispatcher, ManualClock, RouteOutcome, TradeRegistry};
use tokio::sync::mpsc;

const T0: i64 = 1_700_000_000_000;

/// `exchange,base,quote,price,qty,ts` frames; `hb` is a non-trade frame.
struct CsvDecoder;

impl TickDecoder for CsvDecoder {
    fn decode(&self, raw: &str) -> Result<Option<TickInput>, DecodeError> {
        if raw == "hb" {
            return Ok(None);
        }
        let f: Vec<&str> = raw.split(',').collect();
        if f.len() != 6 {
            return Err(DecodeError::MissingField("ts"));
        }
        let num = |field: &'static str, v: &str| {
            v.parse::<f64>().map_err(|_| DecodeError::InvalidNumber {
                field,
                value: v.to_string(),
            })
        };
        Ok(Some(TickInput {
            exchange: f[0].into(),
            base: f[1].into(),
            quote: f[2].into(),
            price: num("price", f[3])?,
            quantity: num("qty", f[4])?,
            server_time_ms: num("ts", f[5])? as i64,
            side: TickSide::Unknown,
        }))
    }
}

fn registry() -> TradeRegistry {
    let cfg = FeedConfig::default()
        .with_pair("binance", "BTC/USD")
        .with_warmup_skip(0);
    TradeRegistry::with_clock(&cfg, Arc::new(ManualClock::new(T0))).unwrap()
}

#[test]
fn handle_routes_decoded_frames_only() {
    let mut d = FeedDispatcher::new(registry(), CsvDecoder, mpsc::channel(1).1);

    assert_eq!(d.handle(TransportEvent::Connected), None);
    assert_eq!(d.handle(TransportEvent::Message("hb".into())), None);
    assert_eq!(d.handle(TransportEvent::Message("garbage".into())), None);
    assert!(matches!(
        d.handle(TransportEvent::Message(format!("binance,BTC,USD,100,1,{T0}"))),
        Some(RouteOutcome::Published(_))
    ));

    let stats = d.registry().stats();
    assert_eq!(stats.messages_undecoded, 1);
    assert_eq!(stats.trades_published, 1);
}

#[tokio::test]
async fn run_processes_events_in_order_and_closes_at_end() {
    let reg = registry();
    let (_, mut events) = reg.subscribe_channel("any");
    let (tx, rx) = mpsc::channel(16);

    let task = tokio::spawn(FeedDispatcher::new(reg, CsvDecoder, rx).run());

    tx.send(TransportEvent::Connected).await.unwrap();
    tx.send(TransportEvent::Message(format!("Binance,btc,usd,100,1,{T0}")))
        .await
        .unwrap();
    tx.send(TransportEvent::Disconnected).await.unwrap();
    tx.send(TransportEvent::Message(format!("binance,BTC,USD,99,2,{}", T0 + 5)))
        .await
        .unwrap();
    drop(tx);

    let reg = task.await.unwrap();

    let mut kinds = vec![];
    while let Ok(e) = events.try_recv() {
        kinds.push(e.info.event);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::Open,
            EventKind::Trade,
            EventKind::TradeRealtime,
            EventKind::Close,
            EventKind::Open,
            EventKind::Trade,
            EventKind::TradeRealtime,
            // end of stream closes the reopened channel
            EventKind::Close,
        ]
    );
    assert_eq!(reg.stats().disconnects, 2);
}
