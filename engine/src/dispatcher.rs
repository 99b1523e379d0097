use corelib::{TickDecoder, TransportEvent};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};

use crate::counters::FeedCounters;
use crate::registry::{RouteOutcome, TradeRegistry};

/// Drives a [`TradeRegistry`] from the transport's event stream.
///
/// Events are handled one at a time, to completion, in arrival order.
pub struct FeedDispatcher<D: TickDecoder> {
    registry: TradeRegistry,
    decoder: D,
    rx: Receiver<TransportEvent>,
}

impl<D: TickDecoder> FeedDispatcher<D> {
    pub fn new(registry: TradeRegistry, decoder: D, rx: Receiver<TransportEvent>) -> Self {
        Self {
            registry,
            decoder,
            rx,
        }
    }

    pub fn registry(&self) -> &TradeRegistry {
        &self.registry
    }

    /// Main loop. When the transport side hangs up every channel is closed,
    /// as on a disconnect, and the registry is handed back.
    pub async fn run(mut self) -> TradeRegistry {
        while let Some(event) = self.rx.recv().await {
            self.handle(event);
        }

        info!("transport stream ended");
        self.registry.on_transport_disconnect();
        self.registry
    }

    pub fn handle(&mut self, event: TransportEvent) -> Option<RouteOutcome> {
        match event {
            TransportEvent::Connected => {
                self.registry.on_transport_connected();
                None
            }
            TransportEvent::Disconnected => {
                self.registry.on_transport_disconnect();
                None
            }
            TransportEvent::Message(raw) => match self.decoder.decode(&raw) {
                Ok(Some(tick)) => Some(self.registry.route_tick(tick)),
                Ok(None) => None,
                Err(e) => {
                    FeedCounters::bump(&self.registry.counters().messages_undecoded);
                    debug!(error = %e, "undecodable message dropped");
                    None
                }
            },
        }
    }
}
