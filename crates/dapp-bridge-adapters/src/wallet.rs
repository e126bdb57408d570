use alloy::primitives::keccak256;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use dapp_bridge_core::{Account, PortError, WalletPort};

use crate::BridgeAdapterConfig;

/// Wallet signing facade. Remote mode speaks JSON-RPC over HTTP to the
/// signing app; deterministic mode answers from fixed accounts with
/// synthetic signatures and is what tests and offline runs use.
#[derive(Debug, Clone)]
pub struct WalletSdkAdapter {
    mode: WalletMode,
}

#[derive(Debug, Clone)]
enum WalletMode {
    Remote(RemoteRuntime),
    Deterministic {
        accounts: Vec<Account>,
        reject_signing: bool,
    },
}

#[derive(Debug, Clone)]
struct RemoteRuntime {
    base_url: String,
    client: reqwest::Client,
}

impl Default for WalletSdkAdapter {
    fn default() -> Self {
        Self::with_config(BridgeAdapterConfig::from_env())
            .unwrap_or_else(|_| Self::deterministic(builtin_accounts()))
    }
}

impl WalletSdkAdapter {
    pub fn with_config(config: BridgeAdapterConfig) -> Result<Self, PortError> {
        let Some(base_url) = config.wallet_base_url else {
            return Ok(Self::deterministic(builtin_accounts()));
        };
        let timeout = std::time::Duration::from_millis(config.wallet_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Transport(format!("wallet client init failed: {e}")))?;
        Ok(Self {
            mode: WalletMode::Remote(RemoteRuntime { base_url, client }),
        })
    }

    pub fn deterministic(accounts: Vec<Account>) -> Self {
        Self {
            mode: WalletMode::Deterministic {
                accounts,
                reject_signing: false,
            },
        }
    }

    /// Deterministic mode that refuses every signing and broadcast call,
    /// for exercising the decline paths.
    pub fn deterministic_rejecting(accounts: Vec<Account>) -> Self {
        Self {
            mode: WalletMode::Deterministic {
                accounts,
                reject_signing: true,
            },
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let WalletMode::Remote(runtime) = &self.mode else {
            return Err(PortError::NotConnected("wallet remote runtime"));
        };
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = runtime
            .client
            .post(&runtime.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("wallet request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("wallet json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "wallet status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(PortError::Rejected(err.to_string()));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("wallet response missing result".to_owned()))
    }

    fn deterministic_accounts(&self) -> Option<&[Account]> {
        match &self.mode {
            WalletMode::Deterministic { accounts, .. } => Some(accounts),
            WalletMode::Remote(_) => None,
        }
    }

    fn check_rejection(&self, operation: &str) -> Result<(), PortError> {
        if let WalletMode::Deterministic {
            reject_signing: true,
            ..
        } = &self.mode
        {
            return Err(PortError::Rejected(format!("{operation} declined by user")));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletPort for WalletSdkAdapter {
    async fn connect(&self) -> Result<(), PortError> {
        match &self.mode {
            WalletMode::Deterministic { .. } => Ok(()),
            WalletMode::Remote(_) => {
                let _ = self.call("wallet_connect", json!([])).await?;
                debug!(target: "wallet", "wallet facade connected");
                Ok(())
            }
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        if let Some(accounts) = self.deterministic_accounts() {
            return Ok(accounts.to_vec());
        }
        let result = self.call("wallet_listAccounts", json!([])).await?;
        serde_json::from_value(result)
            .map_err(|e| PortError::Validation(format!("invalid account list: {e}")))
    }

    async fn request_account(&self, payload: &Value) -> Result<Account, PortError> {
        if let Some(accounts) = self.deterministic_accounts() {
            return accounts
                .first()
                .cloned()
                .ok_or_else(|| PortError::Rejected("no account available".to_owned()));
        }
        let result = self
            .call("wallet_requestAccount", json!([payload]))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| PortError::Validation(format!("invalid account: {e}")))
    }

    async fn sign_transaction(&self, account_id: &str, tx: &Value) -> Result<Value, PortError> {
        self.check_rejection("transaction signing")?;
        if self.deterministic_accounts().is_some() {
            let raw = synthetic_digest(&[b"sign-tx", account_id.as_bytes(), tx.to_string().as_bytes()]);
            return Ok(json!({ "raw": raw }));
        }
        self.call("wallet_signTransaction", json!([account_id, tx]))
            .await
    }

    async fn broadcast_signed_transaction(
        &self,
        account_id: &str,
        signed: &Value,
    ) -> Result<String, PortError> {
        self.check_rejection("transaction broadcast")?;
        if self.deterministic_accounts().is_some() {
            return Ok(synthetic_digest(&[
                b"broadcast",
                account_id.as_bytes(),
                signed.to_string().as_bytes(),
            ]));
        }
        let result = self
            .call(
                "wallet_broadcastSignedTransaction",
                json!([account_id, signed]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| PortError::Validation("broadcast must return tx hash".to_owned()))
    }

    async fn sign_personal_message(
        &self,
        account_id: &str,
        message: &str,
    ) -> Result<String, PortError> {
        self.check_rejection("message signing")?;
        if self.deterministic_accounts().is_some() {
            return Ok(synthetic_signature(account_id, message.as_bytes()));
        }
        let result = self
            .call("wallet_signPersonalMessage", json!([account_id, message]))
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| PortError::Validation("signature must be a hex string".to_owned()))
    }
}

fn builtin_accounts() -> Vec<Account> {
    vec![Account {
        id: "account-1".to_owned(),
        address: "0x1000000000000000000000000000000000000001"
            .parse()
            .expect("valid built-in deterministic account"),
        currency: "ethereum".to_owned(),
    }]
}

fn synthetic_digest(parts: &[&[u8]]) -> String {
    let mut seed = Vec::new();
    for part in parts {
        seed.extend_from_slice(part);
    }
    format!("0x{}", alloy::hex::encode(keccak256(seed)))
}

/// 65-byte (r,s,v) shaped signature derived from the payload.
fn synthetic_signature(account_id: &str, payload: &[u8]) -> String {
    let mut seed = Vec::new();
    seed.extend_from_slice(account_id.as_bytes());
    seed.extend_from_slice(payload);
    let hash = keccak256(seed);
    let mut sig = Vec::with_capacity(65);
    sig.extend_from_slice(hash.as_slice());
    sig.extend_from_slice(hash.as_slice());
    sig.push(27);
    format!("0x{}", alloy::hex::encode(sig))
}
