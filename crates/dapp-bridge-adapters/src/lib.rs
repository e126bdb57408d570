pub mod config;
pub mod frame;
pub mod http_rpc;
pub mod node_ws;
pub mod storage;
pub mod txconv;
pub mod wallet;

pub use config::BridgeAdapterConfig;
pub use frame::{ChannelFrameSink, PostedMessage};
pub use http_rpc::HttpRpcAdapter;
pub use node_ws::{ReconnectingWsTransport, WsTransportFactory};
pub use storage::{MemoryStorageAdapter, ScopedStorage};
pub use txconv::EthTxConverterAdapter;
pub use wallet::WalletSdkAdapter;
