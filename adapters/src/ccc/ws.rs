use std::time::Duration;

use async_trait::async_trait;
use common::logger::{TraceId, child_span, root_span};
use corelib::TransportEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{Instrument, debug, error, info, warn};

use super::FeedTransport;
use super::subscription::subscribe_request;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How a single connection ended.
enum SessionEnd {
    /// Socket closed or failed; reconnect after the delay.
    Dropped,
    /// Nobody is listening for transport events anymore.
    ReceiverGone,
}

/// Client for the streamer WebSocket.
///
/// Each connection:
/// - emits [`TransportEvent::Connected`]
/// - sends one `SubAdd` request with every trade subscription
/// - forwards each text frame as [`TransportEvent::Message`]
/// - emits [`TransportEvent::Disconnected`] when the socket closes or errors
///
/// and then reconnects after `reconnect_delay`.
pub struct StreamerWsClient {
    pub ws_url: String,
    pub reconnect_delay: Duration,
}

impl StreamerWsClient {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    async fn send_subscription(
        write: &mut (impl futures::Sink<Message, Error = tungstenite::Error> + Unpin),
        subs: &[String],
    ) -> anyhow::Result<()> {
        let text = serde_json::to_string(&subscribe_request(subs))?;
        write.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn run_session(&self, subs: &[String], sender: &Sender<TransportEvent>) -> SessionEnd {
        let ws = match connect_async(self.ws_url.as_str()).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                error!(url = %self.ws_url, error = %e, "websocket connection failed");
                return SessionEnd::Dropped;
            }
        };

        info!(url = %self.ws_url, "websocket connected");
        if sender.send(TransportEvent::Connected).await.is_err() {
            return SessionEnd::ReceiverGone;
        }

        let (mut write, mut read) = ws.split();

        let subscribed = Self::send_subscription(&mut write, subs)
            .instrument(child_span("subscribe"))
            .await;
        match subscribed {
            Ok(()) => debug!(subs = subs.len(), "subscription sent"),
            Err(e) => {
                warn!(error = %e, "subscription failed");
                return Self::disconnected(sender).await;
            }
        }

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let event = TransportEvent::Message(text.as_str().to_owned());
                    if sender.send(event).await.is_err() {
                        return SessionEnd::ReceiverGone;
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(?frame, "websocket closed by peer");
                    break;
                }
                // pings are answered by tungstenite on the next read
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "websocket error");
                    break;
                }
            }
        }

        Self::disconnected(sender).await
    }

    async fn disconnected(sender: &Sender<TransportEvent>) -> SessionEnd {
        match sender.send(TransportEvent::Disconnected).await {
            Ok(()) => SessionEnd::Dropped,
            Err(_) => SessionEnd::ReceiverGone,
        }
    }

    /// Connect, subscribe and forward frames until `sender` is closed.
    ///
    /// Connection failures are logged and retried; this only returns once the
    /// receiving side has gone away.
    pub async fn run_ws_loop(&self, subs: Vec<String>, sender: Sender<TransportEvent>) -> anyhow::Result<()> {
        loop {
            let span = root_span("ws_session", &TraceId::default());
            span.record("subs", subs.len());

            if let SessionEnd::ReceiverGone = self.run_session(&subs, &sender).instrument(span).await {
                info!("transport receiver dropped, stopping websocket loop");
                return Ok(());
            }

            info!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting");
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = sender.closed() => {
                    info!("transport receiver dropped, stopping websocket loop");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl FeedTransport for StreamerWsClient {
    async fn stream(&self, subs: Vec<String>, sender: Sender<TransportEvent>) -> anyhow::Result<()> {
        self.run_ws_loop(subs, sender).await
    }
}
