use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Account;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("storage access denied")]
    StorageDenied,
    #[error("not connected: {0}")]
    NotConnected(&'static str),
    #[error("illegal {machine} transition: {from} -> {action}")]
    IllegalTransition {
        machine: &'static str,
        from: String,
        action: String,
    },
}

/// Wallet signing facade. Account listing, signing and broadcasting happen
/// behind this boundary; the bridge never sees key material.
#[async_trait]
pub trait WalletPort: Send + Sync {
    async fn connect(&self) -> Result<(), PortError>;
    async fn list_accounts(&self) -> Result<Vec<Account>, PortError>;
    async fn request_account(&self, payload: &Value) -> Result<Account, PortError>;
    async fn sign_transaction(&self, account_id: &str, tx: &Value) -> Result<Value, PortError>;
    async fn broadcast_signed_transaction(
        &self,
        account_id: &str,
        signed: &Value,
    ) -> Result<String, PortError>;
    async fn sign_personal_message(
        &self,
        account_id: &str,
        message: &str,
    ) -> Result<String, PortError>;
}

/// Scoped key-value store. A denied backend reports
/// [`PortError::StorageDenied`] as a value, never an intercepted fault.
pub trait StoragePort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PortError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PortError>;
}

impl<P: StoragePort + ?Sized> StoragePort for Arc<P> {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        (**self).set(key, value)
    }
}

/// Cross-document delivery into the embedded frame.
pub trait FrameSink: Send + Sync {
    fn post(&self, payload: &Value, target_origin: &str) -> Result<(), PortError>;
    fn is_mounted(&self) -> bool;
}

impl<P: FrameSink + ?Sized> FrameSink for Arc<P> {
    fn post(&self, payload: &Value, target_origin: &str) -> Result<(), PortError> {
        (**self).post(payload, target_origin)
    }

    fn is_mounted(&self) -> bool {
        (**self).is_mounted()
    }
}

pub type NodeMessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Resilient duplex channel to a chain node. Reconnection policy lives
/// entirely inside the implementation; the bridge only connects, sends and
/// closes.
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn connect(&self) -> Result<(), PortError>;
    fn send(&self, payload: &str) -> Result<(), PortError>;
    fn close(&self);
}

pub trait TransportFactory: Send + Sync {
    type Transport: NodeTransport;

    /// Opens a transport bound to one node URL. Every inbound message is
    /// handed to `on_message` verbatim, uncorrelated to outstanding requests.
    fn open(
        &self,
        node_url: &str,
        on_message: NodeMessageHandler,
    ) -> Result<Self::Transport, PortError>;
}

/// Ethereum-shaped transaction to wallet-native shape.
pub trait TxConverterPort: Send + Sync {
    fn to_wallet_transaction(&self, eth_tx: &Value) -> Result<Value, PortError>;
}

/// Single POST of a JSON-RPC envelope to an HTTP(S) node URL.
#[async_trait]
pub trait HttpRpcPort: Send + Sync {
    async fn post_envelope(&self, node_url: &str, envelope: &Value) -> Result<Value, PortError>;
}
