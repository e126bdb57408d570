use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::domain::{Account, BridgeConfig, ChainConfig, OverlayState, SELECTED_ACCOUNT_KEY};
use crate::gateway::MessageGateway;
use crate::ports::{
    FrameSink, HttpRpcPort, NodeMessageHandler, NodeTransport, PortError, StoragePort,
    TransportFactory, TxConverterPort, WalletPort,
};
use crate::router::{self, RouterAction};
use crate::rpc::{chain_id_hex, RpcError, RpcRequest, RpcResponse};
use crate::session::{self, Session};
use crate::state_machine::{connection_transition, ConnectionAction, ConnectionState};

pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
pub const CHAIN_CHANGED: &str = "chainChanged";

/// The proxy singleton: at most one live connection, bound to exactly one
/// chain config, replaced wholesale on chain change.
struct ProxyBinding<T> {
    transport: T,
    chain_id: u64,
}

struct BridgeState<T> {
    session: Session,
    connection: ConnectionState,
    proxy: Option<ProxyBinding<T>>,
    storage_blocked: bool,
}

/// Selection/chain pair captured when an async operation starts. A reply
/// whose snapshot is stale on resolution is discarded instead of being
/// delivered against the wrong account or chain.
#[derive(Debug, Clone)]
struct Snapshot {
    account_id: String,
    address: Address,
    chain: ChainConfig,
}

pub struct Bridge<W, S, C, F, T, H>
where
    W: WalletPort,
    S: StoragePort,
    C: TxConverterPort,
    F: FrameSink + 'static,
    T: TransportFactory,
    H: HttpRpcPort,
{
    config: BridgeConfig,
    gateway: Arc<MessageGateway<F>>,
    wallet: W,
    storage: S,
    converter: C,
    transports: T,
    http: H,
    state: Mutex<BridgeState<T::Transport>>,
}

impl<W, S, C, F, T, H> Bridge<W, S, C, F, T, H>
where
    W: WalletPort,
    S: StoragePort,
    C: TxConverterPort,
    F: FrameSink + 'static,
    T: TransportFactory,
    H: HttpRpcPort,
{
    pub fn new(
        config: BridgeConfig,
        frame: F,
        wallet: W,
        storage: S,
        converter: C,
        transports: T,
        http: H,
    ) -> Result<Self, PortError> {
        let origin = config.dapp_origin()?;
        Ok(Self {
            config,
            gateway: Arc::new(MessageGateway::new(origin, frame)),
            wallet,
            storage,
            converter,
            transports,
            http,
            state: Mutex::new(BridgeState {
                session: Session::default(),
                connection: ConnectionState::Disconnected,
                proxy: None,
                storage_blocked: false,
            }),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn gateway(&self) -> &MessageGateway<F> {
        &self.gateway
    }

    pub fn connection_state(&self) -> Result<ConnectionState, PortError> {
        Ok(self.lock()?.connection)
    }

    pub fn session(&self) -> Result<Session, PortError> {
        Ok(self.lock()?.session.clone())
    }

    /// Open the wallet facade, fetch and filter accounts, resolve the
    /// initial selection, announce the resolved chain and attach the node
    /// proxy when eligible.
    pub async fn mount(&self) -> Result<(), PortError> {
        self.transition(ConnectionAction::OpenWallet)?;
        self.wallet.connect().await?;
        self.transition(ConnectionAction::WalletOpened)?;
        self.fetch_accounts().await?;
        self.transition(ConnectionAction::AccountsResolved)?;
        {
            let mut g = self.lock()?;
            g.session.connected = true;
        }
        if let Some(chain) = self.current_chain()? {
            self.gateway
                .notify(CHAIN_CHANGED, json!([chain_id_hex(chain.chain_id)]))?;
            self.attach_proxy(&chain).await?;
        }
        Ok(())
    }

    /// Lists wallet accounts, keeps the ones a chain config covers and
    /// resolves selection by priority: initial id, persisted id, first
    /// listed. Fails fatally when the resolved account's currency has no
    /// chain config.
    pub async fn fetch_accounts(&self) -> Result<(), PortError> {
        {
            let mut g = self.lock()?;
            g.session.fetching = true;
        }
        let listed = self.wallet.list_accounts().await;
        {
            let mut g = self.lock()?;
            g.session.fetching = false;
        }
        let accounts = session::filter_by_chains(listed?, &self.config.chains);
        let persisted = self.storage_get(SELECTED_ACCOUNT_KEY)?;
        let resolved = session::resolve_selection(
            &accounts,
            self.config.initial_account_id.as_deref(),
            persisted.as_deref(),
        );
        let resolved_account = resolved
            .as_deref()
            .and_then(|id| accounts.iter().find(|a| a.id == id))
            .cloned();
        if let Some(account) = &resolved_account {
            if self.config.chain_for_currency(&account.currency).is_none() {
                return Err(PortError::Config(format!(
                    "no chain config matches currency {}",
                    account.currency
                )));
            }
        }
        debug!(
            target: "bridge",
            accounts = accounts.len(),
            selected = ?resolved,
            "accounts fetched"
        );
        {
            let mut g = self.lock()?;
            g.session.accounts = accounts;
        }
        self.apply_selection(resolved_account).await
    }

    /// User-driven selection. Only accounts already in the session list are
    /// selectable.
    pub async fn select_account(&self, account: Option<Account>) -> Result<(), PortError> {
        if let Some(account) = &account {
            let g = self.lock()?;
            if !g.session.accounts.iter().any(|a| a.id == account.id) {
                return Err(PortError::Validation(format!(
                    "unknown account id: {}",
                    account.id
                )));
            }
        }
        self.apply_selection(account).await
    }

    /// Wallet-driven account pick (the wallet shows its own selection UI),
    /// then the usual selection path.
    pub async fn request_account(&self, payload: &Value) -> Result<Account, PortError> {
        let account = self.wallet.request_account(payload).await?;
        {
            let mut g = self.lock()?;
            if !g.session.accounts.iter().any(|a| a.id == account.id) {
                g.session.accounts.push(account.clone());
            }
        }
        self.apply_selection(Some(account.clone())).await?;
        Ok(account)
    }

    /// One inbound cross-document event. Origin and protocol violations are
    /// dropped inside the gateway; everything else is dispatched.
    pub async fn handle_frame_event(
        &self,
        event_origin: &str,
        payload: &Value,
    ) -> Result<(), PortError> {
        let Some(request) = self.gateway.accept(event_origin, payload) else {
            return Ok(());
        };
        self.dispatch(request).await
    }

    /// Detach the proxy, drop the session, go back to Disconnected. Only the
    /// persisted selection id survives.
    pub fn teardown(&self) -> Result<(), PortError> {
        self.detach_proxy()?;
        let mut g = self.lock()?;
        let (next, t) = connection_transition(g.connection, ConnectionAction::Teardown)?;
        debug!(target: "bridge", from = ?t.from, to = ?t.to, "connection transition");
        g.connection = next;
        g.session.reset();
        Ok(())
    }

    /// Blocking placeholder condition for the host UI.
    pub fn overlay(&self) -> Result<OverlayState, PortError> {
        let g = self.lock()?;
        if g.storage_blocked {
            return Ok(OverlayState::StorageBlocked);
        }
        Ok(match g.connection {
            ConnectionState::Disconnected | ConnectionState::WalletConnecting => {
                OverlayState::WalletNotConnected
            }
            ConnectionState::AccountsFetching => OverlayState::AccountsFetching,
            ConnectionState::Connected if g.session.fetching => OverlayState::AccountsFetching,
            ConnectionState::Connected if g.session.accounts.is_empty() => OverlayState::NoAccounts,
            ConnectionState::Connected => OverlayState::Hidden,
        })
    }

    async fn dispatch(&self, request: RpcRequest) -> Result<(), PortError> {
        let Some(snapshot) = self.snapshot()? else {
            trace!(target: "rpc", method = %request.method, "dropping request before session is ready");
            return Ok(());
        };
        match router::classify(&request) {
            RouterAction::ChainId => {
                self.reply_success(&request, json!(chain_id_hex(snapshot.chain.chain_id)))
            }
            RouterAction::Accounts => {
                self.reply_success(&request, json!([snapshot.address.to_string()]))
            }
            RouterAction::SendTransaction { tx, from } => {
                if !router::signer_matches(from, snapshot.address) {
                    warn!(target: "rpc", "dropping eth_sendTransaction for unselected signer");
                    return Ok(());
                }
                let outcome = self.sign_and_broadcast(&snapshot, &tx).await;
                if self.snapshot_stale(&snapshot)? {
                    trace!(target: "rpc", "discarding eth_sendTransaction reply resolved after session change");
                    return Ok(());
                }
                match outcome {
                    Ok(hash) => self.reply_success(&request, json!(hash)),
                    Err(err) => {
                        debug!(target: "rpc", %err, "transaction flow declined");
                        self.reply_error(&request, RpcError::transaction_declined())
                    }
                }
            }
            RouterAction::PersonalSign { message, address } => {
                if address != snapshot.address {
                    warn!(target: "rpc", "dropping personal_sign for unselected signer");
                    return Ok(());
                }
                let outcome = self
                    .wallet
                    .sign_personal_message(&snapshot.account_id, &message)
                    .await;
                if self.snapshot_stale(&snapshot)? {
                    trace!(target: "rpc", "discarding personal_sign reply resolved after session change");
                    return Ok(());
                }
                match outcome {
                    Ok(signature) => self.reply_success(&request, json!(signature)),
                    Err(err) => {
                        debug!(target: "rpc", %err, "personal_sign declined");
                        self.reply_error(&request, RpcError::request_declined())
                    }
                }
            }
            RouterAction::Forward => self.forward(&snapshot, &request).await,
            RouterAction::Drop => {
                trace!(target: "rpc", method = %request.method, "dropping malformed call");
                Ok(())
            }
        }
    }

    async fn sign_and_broadcast(&self, snapshot: &Snapshot, tx: &Value) -> Result<String, PortError> {
        let native = self.converter.to_wallet_transaction(tx)?;
        let signed = self
            .wallet
            .sign_transaction(&snapshot.account_id, &native)
            .await?;
        self.wallet
            .broadcast_signed_transaction(&snapshot.account_id, &signed)
            .await
    }

    /// Pass-through for methods the bridge does not handle: the live proxy
    /// if one is attached, a single HTTP POST when the node URL allows it,
    /// otherwise a silent drop.
    async fn forward(&self, snapshot: &Snapshot, request: &RpcRequest) -> Result<(), PortError> {
        {
            let g = self.lock()?;
            if let Some(proxy) = &g.proxy {
                let raw = serde_json::to_string(request).map_err(|e| {
                    PortError::Validation(format!("request serialization failed: {e}"))
                })?;
                trace!(target: "rpc", method = %request.method, "forwarding to node proxy");
                return proxy.transport.send(&raw);
            }
        }
        if snapshot.chain.is_http() {
            let envelope = serde_json::to_value(request)
                .map_err(|e| PortError::Validation(format!("request serialization failed: {e}")))?;
            let outcome = self
                .http
                .post_envelope(&snapshot.chain.node_url, &envelope)
                .await;
            if self.snapshot_stale(snapshot)? {
                trace!(target: "rpc", "discarding http relay resolved after session change");
                return Ok(());
            }
            return match outcome {
                // Relayed back unmodified; the node's reply id round-trips.
                Ok(response) => self.gateway.send_value(&response),
                Err(err) => {
                    warn!(target: "rpc", %err, "http relay failed, dropping");
                    Ok(())
                }
            };
        }
        trace!(target: "rpc", method = %request.method, "no proxy path available, dropping");
        Ok(())
    }

    async fn apply_selection(&self, account: Option<Account>) -> Result<(), PortError> {
        let (chain_before, connected) = {
            let mut g = self.lock()?;
            let before = g
                .session
                .selected_account()
                .and_then(|a| self.config.chain_for_currency(&a.currency))
                .map(|c| c.chain_id);
            g.session.selected = account.as_ref().map(|a| a.id.clone());
            (before, g.session.connected)
        };
        if let Some(account) = &account {
            self.storage_set(SELECTED_ACCOUNT_KEY, &account.id)?;
            self.gateway
                .notify(ACCOUNTS_CHANGED, json!([[account.address.to_string()]]))?;
        }
        let chain_after = self.current_chain()?;
        if connected && chain_before != chain_after.as_ref().map(|c| c.chain_id) {
            self.detach_proxy()?;
            if let Some(chain) = &chain_after {
                self.attach_proxy(chain).await?;
                self.gateway
                    .notify(CHAIN_CHANGED, json!([chain_id_hex(chain.chain_id)]))?;
            }
        }
        Ok(())
    }

    fn current_chain(&self) -> Result<Option<ChainConfig>, PortError> {
        let g = self.lock()?;
        Ok(g.session
            .selected_account()
            .and_then(|a| self.config.chain_for_currency(&a.currency))
            .cloned())
    }

    async fn attach_proxy(&self, chain: &ChainConfig) -> Result<(), PortError> {
        if !chain.is_secure_ws() {
            return Ok(());
        }
        // The old connection must be gone before a replacement opens.
        self.detach_proxy()?;
        let gateway = Arc::clone(&self.gateway);
        let handler: NodeMessageHandler = Arc::new(move |raw| gateway.forward_node_message(&raw));
        let transport = self.transports.open(&chain.node_url, handler)?;
        transport.connect().await?;
        let mut g = self.lock()?;
        // The session may have moved on while the connection was opening;
        // a binding for a chain no one is on anymore must not survive.
        let still_wanted = g.connection == ConnectionState::Connected
            && g.session
                .selected_account()
                .and_then(|a| self.config.chain_for_currency(&a.currency))
                .is_some_and(|c| c.chain_id == chain.chain_id);
        if !still_wanted {
            drop(g);
            transport.close();
            debug!(target: "bridge", chain_id = chain.chain_id, "discarding proxy opened for a stale chain");
            return Ok(());
        }
        if let Some(previous) = g.proxy.take() {
            previous.transport.close();
        }
        g.proxy = Some(ProxyBinding {
            transport,
            chain_id: chain.chain_id,
        });
        debug!(target: "bridge", chain_id = chain.chain_id, url = %chain.node_url, "node proxy attached");
        Ok(())
    }

    fn detach_proxy(&self) -> Result<(), PortError> {
        let binding = self.lock()?.proxy.take();
        if let Some(binding) = binding {
            debug!(target: "bridge", chain_id = binding.chain_id, "node proxy detached");
            binding.transport.close();
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Option<Snapshot>, PortError> {
        let g = self.lock()?;
        let Some(account) = g.session.selected_account() else {
            return Ok(None);
        };
        let Some(chain) = self.config.chain_for_currency(&account.currency) else {
            return Ok(None);
        };
        Ok(Some(Snapshot {
            account_id: account.id.clone(),
            address: account.address,
            chain: chain.clone(),
        }))
    }

    fn snapshot_stale(&self, snapshot: &Snapshot) -> Result<bool, PortError> {
        let g = self.lock()?;
        Ok(g.session.selected.as_deref() != Some(snapshot.account_id.as_str()))
    }

    fn transition(&self, action: ConnectionAction) -> Result<(), PortError> {
        let mut g = self.lock()?;
        let (next, t) = connection_transition(g.connection, action)?;
        debug!(target: "bridge", from = ?t.from, to = ?t.to, reason = t.reason, "connection transition");
        g.connection = next;
        Ok(())
    }

    /// Storage reads absorb a denied backend: the bridge flips into the
    /// storage-blocked presentation instead of crashing.
    fn storage_get(&self, key: &str) -> Result<Option<String>, PortError> {
        match self.storage.get(key) {
            Ok(value) => Ok(value),
            Err(PortError::StorageDenied) => {
                self.mark_storage_blocked()?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Writes stop entirely once the backend has been seen denied.
    fn storage_set(&self, key: &str, value: &str) -> Result<(), PortError> {
        if self.lock()?.storage_blocked {
            return Ok(());
        }
        match self.storage.set(key, value) {
            Ok(()) => Ok(()),
            Err(PortError::StorageDenied) => self.mark_storage_blocked(),
            Err(err) => Err(err),
        }
    }

    fn mark_storage_blocked(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if !g.storage_blocked {
            warn!(target: "bridge", "storage backend denied, suspending persistence");
            g.storage_blocked = true;
        }
        Ok(())
    }

    fn reply_success(&self, request: &RpcRequest, result: Value) -> Result<(), PortError> {
        let Some(id) = request.id.clone() else {
            return Ok(());
        };
        self.gateway.send(&RpcResponse::success(id, result))
    }

    fn reply_error(&self, request: &RpcRequest, error: RpcError) -> Result<(), PortError> {
        let Some(id) = request.id.clone() else {
            return Ok(());
        };
        self.gateway.send(&RpcResponse::error(id, error))
    }

    fn lock(&self) -> Result<MutexGuard<'_, BridgeState<T::Transport>>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("bridge lock poisoned: {e}")))
    }
}
