use serde_json::{json, Map, Value};

use dapp_bridge_core::{PortError, TxConverterPort};

/// Reshapes an `eth_sendTransaction` parameter object into the wallet's
/// native transaction form: hex quantities become decimal strings, byte
/// fields stay hex, and the envelope carries the transaction family.
#[derive(Debug, Clone, Default)]
pub struct EthTxConverterAdapter;

impl EthTxConverterAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl TxConverterPort for EthTxConverterAdapter {
    fn to_wallet_transaction(&self, eth_tx: &Value) -> Result<Value, PortError> {
        let fields = eth_tx
            .as_object()
            .ok_or_else(|| PortError::Validation("transaction must be an object".to_owned()))?;
        let mut native = Map::new();
        native.insert("family".to_owned(), json!("ethereum"));
        if let Some(to) = fields.get("to") {
            native.insert("recipient".to_owned(), to.clone());
        }
        native.insert(
            "amount".to_owned(),
            json!(quantity(fields, "value")?.unwrap_or(0).to_string()),
        );
        if let Some(gas) = quantity(fields, "gas")? {
            native.insert("gasLimit".to_owned(), json!(gas.to_string()));
        }
        if let Some(price) = quantity(fields, "gasPrice")? {
            native.insert("gasPrice".to_owned(), json!(price.to_string()));
        }
        if let Some(nonce) = quantity(fields, "nonce")? {
            native.insert("nonce".to_owned(), json!(nonce.to_string()));
        }
        if let Some(data) = fields.get("data").and_then(Value::as_str) {
            native.insert("data".to_owned(), json!(data));
        }
        Ok(Value::Object(native))
    }
}

/// Reads an optional `0x`-prefixed hex quantity field.
fn quantity(fields: &Map<String, Value>, key: &str) -> Result<Option<u128>, PortError> {
    let Some(raw) = fields.get(key) else {
        return Ok(None);
    };
    let text = raw
        .as_str()
        .ok_or_else(|| PortError::Validation(format!("{key} must be a hex string")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| PortError::Validation(format!("{key} must be 0x-prefixed")))?;
    u128::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|e| PortError::Validation(format!("{key} is not a hex quantity: {e}")))
}
