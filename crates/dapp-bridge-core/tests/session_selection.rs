use dapp_bridge_core::session::{filter_by_chains, resolve_selection, Session};
use dapp_bridge_core::{Account, ChainConfig};

fn account(id: &str, address: &str, currency: &str) -> Account {
    Account {
        id: id.to_owned(),
        address: address.parse().expect("valid test address"),
        currency: currency.to_owned(),
    }
}

fn chains() -> Vec<ChainConfig> {
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
    ]
}

fn three_accounts() -> Vec<Account> {
    vec![
        account("acct-1", "0x1000000000000000000000000000000000000001", "ethereum"),
        account("acct-2", "0x1000000000000000000000000000000000000002", "ethereum"),
        account("acct-3", "0x1000000000000000000000000000000000000003", "polygon"),
    ]
}

#[test]
fn filter_drops_unconfigured_currencies() {
    let mut accounts = three_accounts();
    accounts.push(account(
        "acct-4",
        "0x1000000000000000000000000000000000000004",
        "bitcoin",
    ));
    let filtered = filter_by_chains(accounts, &chains());
    assert_eq!(filtered.len(), 3);
    assert!(filtered.iter().all(|a| a.currency != "bitcoin"));
}

#[test]
fn first_account_selected_without_hints() {
    let selected = resolve_selection(&three_accounts(), None, None);
    assert_eq!(selected.as_deref(), Some("acct-1"));
}

#[test]
fn persisted_id_selects_second_account() {
    let selected = resolve_selection(&three_accounts(), None, Some("acct-2"));
    assert_eq!(selected.as_deref(), Some("acct-2"));
}

#[test]
fn initial_id_takes_priority_over_persisted() {
    let selected = resolve_selection(&three_accounts(), Some("acct-3"), Some("acct-2"));
    assert_eq!(selected.as_deref(), Some("acct-3"));
}

#[test]
fn unknown_initial_id_falls_back_to_persisted() {
    let selected = resolve_selection(&three_accounts(), Some("acct-9"), Some("acct-2"));
    assert_eq!(selected.as_deref(), Some("acct-2"));
}

#[test]
fn unknown_hints_fall_back_to_first() {
    let selected = resolve_selection(&three_accounts(), Some("acct-9"), Some("acct-8"));
    assert_eq!(selected.as_deref(), Some("acct-1"));
}

#[test]
fn no_accounts_resolves_to_none() {
    assert_eq!(resolve_selection(&[], Some("acct-1"), Some("acct-2")), None);
}

#[test]
fn selected_account_looks_up_by_id() {
    let session = Session {
        accounts: three_accounts(),
        selected: Some("acct-2".to_owned()),
        connected: true,
        fetching: false,
    };
    let selected = session.selected_account().expect("selection resolves");
    assert_eq!(selected.id, "acct-2");
}

#[test]
fn reset_discards_everything() {
    let mut session = Session {
        accounts: three_accounts(),
        selected: Some("acct-1".to_owned()),
        connected: true,
        fetching: true,
    };
    session.reset();
    assert!(session.accounts.is_empty());
    assert!(session.selected.is_none());
    assert!(!session.connected);
    assert!(!session.fetching);
}
