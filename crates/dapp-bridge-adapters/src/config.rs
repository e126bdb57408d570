#[derive(Debug, Clone)]
pub struct BridgeAdapterConfig {
    /// Base URL of the wallet signing app's JSON-RPC endpoint. Unset means
    /// the deterministic in-memory wallet.
    pub wallet_base_url: Option<String>,
    pub wallet_timeout_ms: u64,
    pub http_rpc_timeout_ms: u64,
    pub node_reconnect_delay_ms: u64,
    pub storage_scope: String,
}

impl Default for BridgeAdapterConfig {
    fn default() -> Self {
        Self {
            wallet_base_url: None,
            wallet_timeout_ms: 15_000,
            http_rpc_timeout_ms: 15_000,
            node_reconnect_delay_ms: 1_000,
            storage_scope: "dapp-bridge".to_owned(),
        }
    }
}

impl BridgeAdapterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wallet_base_url: std::env::var("DAPP_BRIDGE_WALLET_URL").ok(),
            wallet_timeout_ms: env_u64("DAPP_BRIDGE_WALLET_TIMEOUT_MS", defaults.wallet_timeout_ms),
            http_rpc_timeout_ms: env_u64(
                "DAPP_BRIDGE_HTTP_RPC_TIMEOUT_MS",
                defaults.http_rpc_timeout_ms,
            ),
            node_reconnect_delay_ms: env_u64(
                "DAPP_BRIDGE_NODE_RECONNECT_DELAY_MS",
                defaults.node_reconnect_delay_ms,
            ),
            storage_scope: std::env::var("DAPP_BRIDGE_STORAGE_SCOPE")
                .unwrap_or(defaults.storage_scope),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
