use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use dapp_bridge_core::{FrameSink, PortError};

/// One message posted toward the embedded frame, with the origin it was
/// addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub payload: Value,
    pub target_origin: String,
}

/// Frame sink backed by a tokio channel. The host side drains the receiver
/// and hands payloads to whatever embeds the frame; unmounting flips a flag
/// so late posts turn into errors the gateway swallows.
#[derive(Debug)]
pub struct ChannelFrameSink {
    tx: mpsc::UnboundedSender<PostedMessage>,
    mounted: AtomicBool,
}

impl ChannelFrameSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PostedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                mounted: AtomicBool::new(true),
            },
            rx,
        )
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        trace!(target: "frame", "frame sink unmounted");
    }
}

impl FrameSink for ChannelFrameSink {
    fn post(&self, payload: &Value, target_origin: &str) -> Result<(), PortError> {
        if !self.is_mounted() {
            return Err(PortError::NotConnected("frame unmounted"));
        }
        self.tx
            .send(PostedMessage {
                payload: payload.clone(),
                target_origin: target_origin.to_owned(),
            })
            .map_err(|_| PortError::Transport("frame receiver gone".to_owned()))
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}
