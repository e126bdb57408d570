use crate::ports::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    WalletConnecting,
    AccountsFetching,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    OpenWallet,
    WalletOpened,
    AccountsResolved,
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub reason: &'static str,
}

pub fn connection_transition(
    state: ConnectionState,
    action: ConnectionAction,
) -> Result<(ConnectionState, ConnectionTransition), PortError> {
    use ConnectionAction as A;
    use ConnectionState as S;

    let to = match (state, action) {
        (S::Disconnected, A::OpenWallet) => S::WalletConnecting,
        (S::WalletConnecting, A::WalletOpened) => S::AccountsFetching,
        (S::AccountsFetching, A::AccountsResolved) => S::Connected,
        // Teardown is legal from every state.
        (_, A::Teardown) => S::Disconnected,
        _ => {
            return Err(PortError::IllegalTransition {
                machine: "connection",
                from: format!("{state:?}"),
                action: format!("{action:?}"),
            })
        }
    };
    Ok((
        to,
        ConnectionTransition {
            from: state,
            to,
            reason: connection_reason(action),
        },
    ))
}

fn connection_reason(action: ConnectionAction) -> &'static str {
    match action {
        ConnectionAction::OpenWallet => "open_wallet",
        ConnectionAction::WalletOpened => "wallet_opened",
        ConnectionAction::AccountsResolved => "accounts_resolved",
        ConnectionAction::Teardown => "teardown",
    }
}

/// Reconnecting transport machine. `Reconnecting -> Connecting` is always
/// legal, which is what makes retry attempts unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Connect,
    Opened,
    Dropped,
    Retry,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportTransition {
    pub from: TransportState,
    pub to: TransportState,
    pub reason: &'static str,
}

pub fn transport_transition(
    state: TransportState,
    action: TransportAction,
) -> Result<(TransportState, TransportTransition), PortError> {
    use TransportAction as A;
    use TransportState as S;

    let to = match (state, action) {
        (S::Idle, A::Connect) => S::Connecting,
        (S::Connecting, A::Opened) => S::Open,
        (S::Connecting | S::Open, A::Dropped) => S::Reconnecting,
        (S::Reconnecting, A::Retry) => S::Connecting,
        (_, A::Close) => S::Closed,
        _ => {
            return Err(PortError::IllegalTransition {
                machine: "transport",
                from: format!("{state:?}"),
                action: format!("{action:?}"),
            })
        }
    };
    Ok((
        to,
        TransportTransition {
            from: state,
            to,
            reason: transport_reason(action),
        },
    ))
}

fn transport_reason(action: TransportAction) -> &'static str {
    match action {
        TransportAction::Connect => "connect",
        TransportAction::Opened => "opened",
        TransportAction::Dropped => "dropped",
        TransportAction::Retry => "retry",
        TransportAction::Close => "close",
    }
}
