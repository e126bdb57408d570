use serde_json::Value;
use tracing::{trace, warn};

use crate::ports::{FrameSink, PortError};
use crate::rpc::{RpcRequest, RpcResponse};

/// Sandbox boundary between the bridge and the embedded frame. No envelope
/// crosses it in either direction without an exact origin match.
pub struct MessageGateway<F: FrameSink> {
    origin: String,
    frame: F,
}

impl<F: FrameSink> MessageGateway<F> {
    pub fn new(origin: String, frame: F) -> Self {
        Self { origin, frame }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Validates an inbound event. Mismatched origins and payloads that are
    /// not JSON-RPC 2.0 envelopes are dropped without a reply.
    pub fn accept(&self, event_origin: &str, payload: &Value) -> Option<RpcRequest> {
        if event_origin != self.origin {
            warn!(target: "gateway", origin = %event_origin, "dropping message from unexpected origin");
            return None;
        }
        match serde_json::from_value::<RpcRequest>(payload.clone()) {
            Ok(request) => Some(request),
            Err(err) => {
                trace!(target: "gateway", %err, "dropping non-jsonrpc payload");
                None
            }
        }
    }

    pub fn send(&self, response: &RpcResponse) -> Result<(), PortError> {
        let payload = serde_json::to_value(response)
            .map_err(|e| PortError::Validation(format!("response serialization failed: {e}")))?;
        self.send_value(&payload)
    }

    /// Delivers a raw payload, addressed only to the dapp origin. No-op when
    /// the frame is unmounted.
    pub fn send_value(&self, payload: &Value) -> Result<(), PortError> {
        if !self.frame.is_mounted() {
            trace!(target: "gateway", "frame unmounted, dropping outbound payload");
            return Ok(());
        }
        self.frame.post(payload, &self.origin)
    }

    pub fn notify(&self, method: &str, params: Value) -> Result<(), PortError> {
        let notification = RpcRequest::notification(method, params);
        let payload = serde_json::to_value(&notification).map_err(|e| {
            PortError::Validation(format!("notification serialization failed: {e}"))
        })?;
        self.send_value(&payload)
    }

    /// Relays a node message verbatim. The node's own reply ids round-trip;
    /// nothing here correlates them to outstanding requests.
    pub fn forward_node_message(&self, raw: &str) {
        match serde_json::from_str::<Value>(raw) {
            Ok(payload) => {
                if let Err(err) = self.send_value(&payload) {
                    warn!(target: "gateway", %err, "failed to relay node message");
                }
            }
            Err(err) => warn!(target: "gateway", %err, "dropping non-json node message"),
        }
    }

    pub fn mounted(&self) -> bool {
        self.frame.is_mounted()
    }
}
