#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use dapp_bridge_adapters::{
    ChannelFrameSink, EthTxConverterAdapter, MemoryStorageAdapter, PostedMessage, WalletSdkAdapter,
};
use dapp_bridge_core::{
    Account, Bridge, BridgeConfig, ChainConfig, HttpRpcPort, NodeMessageHandler, NodeTransport,
    PortError, TransportFactory, WalletPort,
};

pub const ORIGIN: &str = "https://dapp.example";
pub const DAPP_URL: &str = "https://dapp.example/app";

pub const ADDR_1: &str = "0x1000000000000000000000000000000000000001";
pub const ADDR_2: &str = "0x2000000000000000000000000000000000000002";
pub const ADDR_3: &str = "0x3000000000000000000000000000000000000003";
pub const ADDR_4: &str = "0x4000000000000000000000000000000000000004";

pub type TestBridge<W = WalletSdkAdapter> = Bridge<
    W,
    Arc<MemoryStorageAdapter>,
    EthTxConverterAdapter,
    Arc<ChannelFrameSink>,
    MockTransportFactory,
    MockHttpRpc,
>;

pub struct Harness<W: WalletPort = WalletSdkAdapter> {
    pub bridge: TestBridge<W>,
    pub sink: Arc<ChannelFrameSink>,
    pub frames: mpsc::UnboundedReceiver<PostedMessage>,
    pub storage: Arc<MemoryStorageAdapter>,
    pub transports: MockTransportFactory,
    pub http: MockHttpRpc,
}

impl<W: WalletPort> Harness<W> {
    pub fn drain(&mut self) -> Vec<PostedMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.frames.try_recv() {
            out.push(message);
        }
        out
    }
}

pub fn harness(config: BridgeConfig, wallet: WalletSdkAdapter) -> Harness {
    harness_with_storage(config, wallet, Arc::new(MemoryStorageAdapter::new()))
}

pub fn harness_with_storage<W: WalletPort>(
    config: BridgeConfig,
    wallet: W,
    storage: Arc<MemoryStorageAdapter>,
) -> Harness<W> {
    let (sink, frames) = ChannelFrameSink::new();
    let sink = Arc::new(sink);
    let transports = MockTransportFactory::default();
    let http = MockHttpRpc::default();
    let bridge = Bridge::new(
        config,
        Arc::clone(&sink),
        wallet,
        Arc::clone(&storage),
        EthTxConverterAdapter::new(),
        transports.clone(),
        http.clone(),
    )
    .expect("bridge config is valid");
    Harness {
        bridge,
        sink,
        frames,
        storage,
        transports,
        http,
    }
}

pub fn account(id: &str, address: &str, currency: &str) -> Account {
    Account {
        id: id.to_owned(),
        address: address.parse().expect("valid fixture address"),
        currency: currency.to_owned(),
    }
}

pub fn chains() -> Vec<ChainConfig> {
    vec![
        ChainConfig {
            currency: "ethereum".to_owned(),
            chain_id: 1,
            node_url: "wss://node.example/eth".to_owned(),
        },
        ChainConfig {
            currency: "polygon".to_owned(),
            chain_id: 137,
            node_url: "https://node.example/polygon".to_owned(),
        },
        ChainConfig {
            currency: "gnosis".to_owned(),
            chain_id: 100,
            node_url: "wss://node.example/gnosis".to_owned(),
        },
        ChainConfig {
            currency: "cosmos".to_owned(),
            chain_id: 118,
            node_url: "tcp://node.example/cosmos".to_owned(),
        },
    ]
}

pub fn config(initial_account_id: Option<&str>) -> BridgeConfig {
    BridgeConfig {
        dapp_url: DAPP_URL.to_owned(),
        display_name: "Test Dapp".to_owned(),
        theme: None,
        signing_app: None,
        initial_account_id: initial_account_id.map(str::to_owned),
        chains: chains(),
    }
}

pub fn rpc(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub struct TransportProbe {
    pub url: String,
    sent: Mutex<Vec<String>>,
    connected: AtomicBool,
    closed: AtomicBool,
    handler: NodeMessageHandler,
}

impl TransportProbe {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("probe lock").clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Plays a message arriving from the node side.
    pub fn inject(&self, raw: &str) {
        (self.handler)(raw.to_owned());
    }
}

pub struct MockTransport {
    probe: Arc<TransportProbe>,
    slow: Arc<AtomicBool>,
}

#[async_trait]
impl NodeTransport for MockTransport {
    async fn connect(&self) -> Result<(), PortError> {
        if self.slow.load(Ordering::SeqCst) {
            // Parks once so other futures can run while the link opens.
            tokio::task::yield_now().await;
        }
        self.probe.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn send(&self, payload: &str) -> Result<(), PortError> {
        if self.probe.is_closed() {
            return Err(PortError::NotConnected("transport closed"));
        }
        self.probe
            .sent
            .lock()
            .expect("probe lock")
            .push(payload.to_owned());
        Ok(())
    }

    fn close(&self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MockTransportFactory {
    opened: Arc<Mutex<Vec<Arc<TransportProbe>>>>,
    slow_connect: Arc<AtomicBool>,
}

impl MockTransportFactory {
    pub fn opened(&self) -> Vec<Arc<TransportProbe>> {
        self.opened.lock().expect("factory lock").clone()
    }

    /// Makes every later `connect` suspend once before resolving.
    pub fn slow_connect(&self) {
        self.slow_connect.store(true, Ordering::SeqCst);
    }
}

impl TransportFactory for MockTransportFactory {
    type Transport = MockTransport;

    fn open(
        &self,
        node_url: &str,
        on_message: NodeMessageHandler,
    ) -> Result<Self::Transport, PortError> {
        let probe = Arc::new(TransportProbe {
            url: node_url.to_owned(),
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            handler: on_message,
        });
        self.opened.lock().expect("factory lock").push(Arc::clone(&probe));
        Ok(MockTransport {
            probe,
            slow: Arc::clone(&self.slow_connect),
        })
    }
}

/// Wallet wrapper whose signing calls park once before resolving, so an
/// in-flight request can race a selection change.
pub struct YieldingWallet(pub WalletSdkAdapter);

#[async_trait]
impl WalletPort for YieldingWallet {
    async fn connect(&self) -> Result<(), PortError> {
        self.0.connect().await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        self.0.list_accounts().await
    }

    async fn request_account(&self, payload: &Value) -> Result<Account, PortError> {
        self.0.request_account(payload).await
    }

    async fn sign_transaction(&self, account_id: &str, tx: &Value) -> Result<Value, PortError> {
        tokio::task::yield_now().await;
        self.0.sign_transaction(account_id, tx).await
    }

    async fn broadcast_signed_transaction(
        &self,
        account_id: &str,
        signed: &Value,
    ) -> Result<String, PortError> {
        self.0.broadcast_signed_transaction(account_id, signed).await
    }

    async fn sign_personal_message(
        &self,
        account_id: &str,
        message: &str,
    ) -> Result<String, PortError> {
        tokio::task::yield_now().await;
        self.0.sign_personal_message(account_id, message).await
    }
}

#[derive(Clone)]
pub struct MockHttpRpc {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    response: Arc<Mutex<Value>>,
}

impl Default for MockHttpRpc {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(
                json!({ "jsonrpc": "2.0", "id": 1, "result": "0x0" }),
            )),
        }
    }
}

impl MockHttpRpc {
    pub fn set_response(&self, response: Value) {
        *self.response.lock().expect("http lock") = response;
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("http lock").clone()
    }
}

#[async_trait]
impl HttpRpcPort for MockHttpRpc {
    async fn post_envelope(&self, node_url: &str, envelope: &Value) -> Result<Value, PortError> {
        self.calls
            .lock()
            .expect("http lock")
            .push((node_url.to_owned(), envelope.clone()));
        Ok(self.response.lock().expect("http lock").clone())
    }
}
