pub mod bridge;
pub mod domain;
pub mod gateway;
pub mod ports;
pub mod router;
pub mod rpc;
pub mod session;
pub mod state_machine;

pub use bridge::{Bridge, ACCOUNTS_CHANGED, CHAIN_CHANGED};
pub use domain::{Account, BridgeConfig, ChainConfig, OverlayState, SELECTED_ACCOUNT_KEY};
pub use gateway::MessageGateway;
pub use ports::{
    FrameSink, HttpRpcPort, NodeMessageHandler, NodeTransport, PortError, StoragePort,
    TransportFactory, TxConverterPort, WalletPort,
};
pub use router::RouterAction;
pub use rpc::{chain_id_hex, Id, ResponseResult, RpcError, RpcRequest, RpcResponse, Version};
pub use session::Session;
pub use state_machine::{
    connection_transition, transport_transition, ConnectionAction, ConnectionState,
    ConnectionTransition, TransportAction, TransportState, TransportTransition,
};
