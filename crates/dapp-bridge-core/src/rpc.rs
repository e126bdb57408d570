use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC protocol version marker; anything but "2.0" fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "2.0")]
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: Id, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: Version::V2,
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Notifications carry no id and expect no reply.
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: Version::V2,
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.as_array().and_then(|p| p.get(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: Version,
    pub id: Id,
    #[serde(flatten)]
    pub result: ResponseResult,
}

impl RpcResponse {
    pub fn success(id: Id, result: Value) -> Self {
        Self {
            jsonrpc: Version::V2,
            id,
            result: ResponseResult::Success(result),
        }
    }

    pub fn error(id: Id, error: RpcError) -> Self {
        Self {
            jsonrpc: Version::V2,
            id,
            result: ResponseResult::Error(error),
        }
    }
}

/// Result of a single call, either success or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum ResponseResult {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn declined(message: &str) -> Self {
        Self {
            code: 3,
            message: message.to_owned(),
            data: Some(json!([{ "code": 104, "message": "Rejected" }])),
        }
    }

    /// Fixed reply for a refused `eth_sendTransaction`.
    pub fn transaction_declined() -> Self {
        Self::declined("Transaction declined")
    }

    /// Fixed reply for a refused `personal_sign`.
    pub fn request_declined() -> Self {
        Self::declined("Request declined")
    }
}

/// "0x"-prefixed lowercase hex, no leading zeroes: 1 -> "0x1", 137 -> "0x89".
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}
