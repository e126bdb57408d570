use alloy::primitives::Address;
use serde_json::Value;

use crate::rpc::RpcRequest;

/// What the router decided for one validated envelope. The method table is
/// exact string match; everything unrecognized is forwarded to the node
/// path, and malformed locally-handled calls are dropped without a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    ChainId,
    Accounts,
    SendTransaction {
        tx: Value,
        from: Option<Address>,
    },
    PersonalSign {
        message: String,
        address: Address,
    },
    Forward,
    Drop,
}

pub fn classify(request: &RpcRequest) -> RouterAction {
    match request.method.as_str() {
        "eth_chainId" => RouterAction::ChainId,
        "eth_requestAccounts" | "enable" | "eth_accounts" => RouterAction::Accounts,
        "eth_sendTransaction" => match request.param(0) {
            Some(tx @ Value::Object(_)) => RouterAction::SendTransaction {
                from: address_field(tx.get("from")),
                tx: tx.clone(),
            },
            _ => RouterAction::Drop,
        },
        "personal_sign" => {
            let message = request.param(0).and_then(Value::as_str);
            let address = address_field(request.param(1));
            match (message, address) {
                (Some(message), Some(address)) => RouterAction::PersonalSign {
                    message: message.to_owned(),
                    address,
                },
                _ => RouterAction::Drop,
            }
        }
        _ => RouterAction::Forward,
    }
}

/// Address parsing is what makes the signer guard case-insensitive: any hex
/// casing of the same account parses to the same value, and garbage parses
/// to nothing.
fn address_field(value: Option<&Value>) -> Option<Address> {
    value.and_then(Value::as_str).and_then(|s| s.parse().ok())
}

pub fn signer_matches(requested: Option<Address>, selected: Address) -> bool {
    requested == Some(selected)
}
