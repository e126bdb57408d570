use dapp_bridge_core::{BridgeConfig, ChainConfig, PortError};

fn chain(currency: &str, chain_id: u64, node_url: &str) -> ChainConfig {
    ChainConfig {
        currency: currency.to_owned(),
        chain_id,
        node_url: node_url.to_owned(),
    }
}

fn config(dapp_url: &str, theme: Option<&str>) -> BridgeConfig {
    BridgeConfig {
        dapp_url: dapp_url.to_owned(),
        display_name: "Test Dapp".to_owned(),
        theme: theme.map(str::to_owned),
        signing_app: None,
        initial_account_id: None,
        chains: vec![
            chain("ethereum", 1, "wss://node.example/eth"),
            chain("ethereum", 5, "wss://node.example/goerli"),
            chain("polygon", 137, "https://node.example/polygon"),
        ],
    }
}

#[test]
fn origin_strips_path_and_query() {
    let config = config("https://dapp.example/app?ref=home", None);
    assert_eq!(
        config.dapp_origin().expect("origin resolves"),
        "https://dapp.example"
    );
}

#[test]
fn origin_keeps_explicit_port() {
    let config = config("https://dapp.example:8443/app", None);
    assert_eq!(
        config.dapp_origin().expect("origin resolves"),
        "https://dapp.example:8443"
    );
}

#[test]
fn opaque_origin_is_a_config_error() {
    let config = config("data:text/html,hello", None);
    assert!(matches!(config.dapp_origin(), Err(PortError::Config(_))));
}

#[test]
fn frame_url_appends_theme_hint() {
    let config = config("https://dapp.example/app", Some("dark"));
    assert_eq!(
        config.frame_url().expect("url resolves"),
        "https://dapp.example/app?theme=dark"
    );
}

#[test]
fn frame_url_without_theme_is_unchanged() {
    let config = config("https://dapp.example/app", None);
    assert_eq!(
        config.frame_url().expect("url resolves"),
        "https://dapp.example/app"
    );
}

#[test]
fn first_chain_config_wins_for_duplicate_currency() {
    let config = config("https://dapp.example/app", None);
    let chain = config.chain_for_currency("ethereum").expect("chain found");
    assert_eq!(chain.chain_id, 1);
    assert!(config.chain_for_currency("bitcoin").is_none());
}

#[test]
fn node_url_scheme_predicates() {
    assert!(chain("e", 1, "wss://node.example/eth").is_secure_ws());
    assert!(!chain("e", 1, "ws://node.example/eth").is_secure_ws());
    assert!(chain("p", 137, "https://node.example/p").is_http());
    assert!(chain("p", 137, "http://node.example/p").is_http());
    assert!(!chain("c", 118, "tcp://node.example/c").is_secure_ws());
    assert!(!chain("c", 118, "tcp://node.example/c").is_http());
    assert!(!chain("x", 0, "not a url").is_secure_ws());
}
