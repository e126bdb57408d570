use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use dapp_bridge_core::{HttpRpcPort, PortError};

use crate::BridgeAdapterConfig;

/// Per-call JSON-RPC POST to an http(s) node URL. No connection is held
/// between calls and the response body is relayed back unmodified.
#[derive(Debug, Clone)]
pub struct HttpRpcAdapter {
    client: reqwest::Client,
}

impl Default for HttpRpcAdapter {
    fn default() -> Self {
        Self::with_config(&BridgeAdapterConfig::default())
            .unwrap_or_else(|_| Self {
                client: reqwest::Client::new(),
            })
    }
}

impl HttpRpcAdapter {
    pub fn with_config(config: &BridgeAdapterConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.http_rpc_timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("rpc client init failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpRpcPort for HttpRpcAdapter {
    async fn post_envelope(&self, node_url: &str, envelope: &Value) -> Result<Value, PortError> {
        let response = self
            .client
            .post(node_url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("rpc request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("rpc json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!("rpc status {status}: {body}")));
        }
        debug!(target: "rpc", %node_url, "http rpc envelope relayed");
        Ok(body)
    }
}
