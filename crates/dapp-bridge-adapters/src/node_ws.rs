use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};
use url::Url;

use dapp_bridge_core::{
    transport_transition, NodeMessageHandler, NodeTransport, PortError, TransportAction,
    TransportFactory, TransportState,
};

/// Opens one reconnecting websocket transport per node URL.
#[derive(Debug, Clone)]
pub struct WsTransportFactory {
    reconnect_delay: Duration,
}

impl Default for WsTransportFactory {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(1_000),
        }
    }
}

impl WsTransportFactory {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self { reconnect_delay }
    }
}

impl TransportFactory for WsTransportFactory {
    type Transport = ReconnectingWsTransport;

    fn open(
        &self,
        node_url: &str,
        on_message: NodeMessageHandler,
    ) -> Result<Self::Transport, PortError> {
        let parsed = Url::parse(node_url)
            .map_err(|e| PortError::Validation(format!("invalid node url: {e}")))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(PortError::Validation(format!(
                "unsupported node url scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(ReconnectingWsTransport::new(
            node_url.to_owned(),
            on_message,
            self.reconnect_delay,
        ))
    }
}

/// Persistent duplex channel to a chain node. Retries forever with a fixed
/// delay; outbound messages queue while the link is down. Inbound text
/// frames go to the message handler verbatim.
pub struct ReconnectingWsTransport {
    url: String,
    state: Arc<Mutex<TransportState>>,
    handler: NodeMessageHandler,
    reconnect_delay: Duration,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    shutdown: watch::Sender<bool>,
}

impl ReconnectingWsTransport {
    fn new(url: String, handler: NodeMessageHandler, reconnect_delay: Duration) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Self {
            url,
            state: Arc::new(Mutex::new(TransportState::Idle)),
            handler,
            reconnect_delay,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            shutdown,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
            .lock()
            .map(|g| *g)
            .unwrap_or(TransportState::Closed)
    }
}

#[async_trait]
impl NodeTransport for ReconnectingWsTransport {
    async fn connect(&self) -> Result<(), PortError> {
        let outbound_rx = self
            .outbound_rx
            .lock()
            .map_err(|e| PortError::Transport(format!("transport lock poisoned: {e}")))?
            .take()
            .ok_or(PortError::NotConnected("transport already started"))?;
        apply(&self.state, TransportAction::Connect);
        tokio::spawn(drive(
            self.url.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.handler),
            self.reconnect_delay,
            outbound_rx,
            self.shutdown.subscribe(),
        ));
        Ok(())
    }

    fn send(&self, payload: &str) -> Result<(), PortError> {
        if self.state() == TransportState::Closed {
            return Err(PortError::NotConnected("transport closed"));
        }
        self.outbound_tx
            .send(payload.to_owned())
            .map_err(|_| PortError::Transport("transport driver gone".to_owned()))
    }

    fn close(&self) {
        let _ = self.shutdown.send(true);
        apply(&self.state, TransportAction::Close);
    }
}

impl Drop for ReconnectingWsTransport {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn drive(
    url: String,
    state: Arc<Mutex<TransportState>>,
    handler: NodeMessageHandler,
    reconnect_delay: Duration,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                apply(&state, TransportAction::Opened);
                debug!(target: "transport", %url, "node connection open");
                let (mut sink, mut stream) = ws.split();
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown.changed() => {
                            let _ = sink.close().await;
                            apply(&state, TransportAction::Close);
                            return;
                        }
                        queued = outbound.recv() => match queued {
                            Some(text) => {
                                if sink.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            // The owning transport is gone.
                            None => {
                                let _ = sink.close().await;
                                apply(&state, TransportAction::Close);
                                return;
                            }
                        },
                        inbound = stream.next() => match inbound {
                            Some(Ok(Message::Text(text))) => (handler)(text),
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                    }
                }
                apply(&state, TransportAction::Dropped);
                debug!(target: "transport", %url, "node connection dropped");
            }
            Err(err) => {
                apply(&state, TransportAction::Dropped);
                warn!(target: "transport", %url, %err, "node connection attempt failed");
            }
        }
        if *shutdown.borrow() {
            apply(&state, TransportAction::Close);
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
        if *shutdown.borrow() {
            apply(&state, TransportAction::Close);
            return;
        }
        apply(&state, TransportAction::Retry);
    }
}

fn apply(state: &Arc<Mutex<TransportState>>, action: TransportAction) {
    let mut g = match state.lock() {
        Ok(g) => g,
        Err(err) => {
            warn!(target: "transport", %err, "transport state lock poisoned");
            return;
        }
    };
    match transport_transition(*g, action) {
        Ok((next, t)) => {
            trace!(target: "transport", from = ?t.from, to = ?t.to, reason = t.reason, "transport transition");
            *g = next;
        }
        Err(err) => warn!(target: "transport", %err, "ignoring transport action"),
    }
}
