use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ports::PortError;

/// Storage key holding the id of the last selected account. The key is
/// scoped by the storage adapter, not here.
pub const SELECTED_ACCOUNT_KEY: &str = "selected-account-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub address: Address,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub currency: String,
    #[serde(rename = "chainID")]
    pub chain_id: u64,
    #[serde(rename = "nodeURL")]
    pub node_url: String,
}

impl ChainConfig {
    fn node_scheme(&self) -> Option<String> {
        Url::parse(&self.node_url)
            .ok()
            .map(|u| u.scheme().to_owned())
    }

    /// Eligible for a persistent proxy connection.
    pub fn is_secure_ws(&self) -> bool {
        self.node_scheme().as_deref() == Some("wss")
    }

    /// Eligible for the per-call HTTP fallback.
    pub fn is_http(&self) -> bool {
        matches!(self.node_scheme().as_deref(), Some("http") | Some("https"))
    }
}

/// Static configuration handed over by the hosting collaborator.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub dapp_url: String,
    pub display_name: String,
    pub theme: Option<String>,
    pub signing_app: Option<String>,
    pub initial_account_id: Option<String>,
    pub chains: Vec<ChainConfig>,
}

impl BridgeConfig {
    /// Exact origin the gateway accepts from and addresses to.
    pub fn dapp_origin(&self) -> Result<String, PortError> {
        let parsed = Url::parse(&self.dapp_url)
            .map_err(|e| PortError::Config(format!("invalid dapp url: {e}")))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(PortError::Config(format!(
                "dapp url has an opaque origin: {}",
                self.dapp_url
            )));
        }
        Ok(origin.ascii_serialization())
    }

    /// The URL loaded into the embedded frame, with the theme hint appended.
    pub fn frame_url(&self) -> Result<String, PortError> {
        let mut parsed = Url::parse(&self.dapp_url)
            .map_err(|e| PortError::Config(format!("invalid dapp url: {e}")))?;
        if let Some(theme) = &self.theme {
            parsed.query_pairs_mut().append_pair("theme", theme);
        }
        Ok(parsed.into())
    }

    /// At most one config per currency; on ambiguous input the first listed
    /// config wins.
    pub fn chain_for_currency(&self, currency: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.currency == currency)
    }
}

/// Blocking placeholder condition surfaced to the host while preconditions
/// are unmet. Rendering is the host's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    WalletNotConnected,
    AccountsFetching,
    NoAccounts,
    StorageBlocked,
    Hidden,
}
