#![allow(non_snake_case)]

use alloy_primitives::U256;
use wallet_gateway::{
    ConnectOutcome,
    GatewayError,
    WalletGateway,
    test_helpers::{
        MockProvider,
        connected_gateway,
        gateway,
        one_ether,
        player,
        test_config,
    },
    view::{
        ADDRESS_SEPARATOR,
        NoticeLevel,
        shorten_address,
    },
};

#[tokio::test]
async fn connect__without_provider_is_a_silent_no_op() {
    // given
    let mut gateway = WalletGateway::<MockProvider>::new(None, test_config()).unwrap();
    let before = gateway.view().clone();

    // when
    let outcome = gateway.connect().await.unwrap();

    // then
    assert_eq!(outcome, ConnectOutcome::NoProvider);
    assert_eq!(gateway.view(), &before);
    assert!(gateway.session().is_none());
}

#[tokio::test]
async fn connect__reveals_wallet_panel_with_balances() {
    // given
    let provider = MockProvider::new();
    provider.set_balance(player(), one_ether() * U256::from(3u8) / U256::from(2u8));
    provider.set_token_balance(one_ether() * U256::from(42u8));
    let mut gateway = gateway(provider);

    // when
    let outcome = gateway.connect().await.unwrap();

    // then
    assert_eq!(outcome, ConnectOutcome::Connected);
    let view = gateway.view();
    assert!(view.wallet_panel_visible);
    assert!(!view.connect_button_visible);
    assert_eq!(view.wallet_balance, "1.5000");
    assert_eq!(view.token_balance, "42");
    let session = gateway.session().unwrap();
    assert_eq!(session.address, player());
    assert_eq!(session.token_balance, one_ether() * U256::from(42u8));
}

#[tokio::test]
async fn connect__shows_shortened_address() {
    // given
    let gateway = connected_gateway(MockProvider::new()).await;

    // when
    let shown = &gateway.view().wallet_address;

    // then
    let full = player().to_checksum(None);
    assert_eq!(shown, &shorten_address(&full));
    assert!(shown.starts_with(&full[..5]));
    assert!(shown.ends_with(&full[full.len() - 5..]));
    assert!(shown.contains(ADDRESS_SEPARATOR));
}

#[tokio::test]
async fn connect__low_balance_warns_and_keeps_panel_hidden() {
    // given
    let provider = MockProvider::new();
    provider.set_balance(player(), U256::from(99_999_999_999_999u64));
    let mut gateway = gateway(provider);

    // when
    let outcome = gateway.connect().await.unwrap();

    // then
    assert_eq!(outcome, ConnectOutcome::LowBalance);
    let view = gateway.view();
    assert!(!view.wallet_panel_visible);
    assert!(view.connect_button_visible);
    let notice = view.latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "You need more ETH");
}

#[tokio::test]
async fn connect__exact_minimum_balance_is_enough() {
    // given
    let provider = MockProvider::new();
    provider.set_balance(player(), U256::from(100_000_000_000_000u64));
    let mut gateway = gateway(provider);

    // when
    let outcome = gateway.connect().await.unwrap();

    // then
    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(gateway.view().wallet_balance, "0.0001");
}

#[tokio::test]
async fn connect__rejects_unsupported_wallet_brand() {
    // given
    let provider = MockProvider::new();
    provider.set_client_version("TrustWallet/v8.2.0");
    let mut gateway = gateway(provider);

    // when
    let result = gateway.connect().await;

    // then
    assert!(matches!(result, Err(GatewayError::UnsupportedWallet(_))));
    assert_eq!(
        gateway.view().latest_notice().unwrap().message,
        "Trust Wallet is not supported. Please use another wallet."
    );
    assert!(!gateway.view().wallet_panel_visible);
    assert!(gateway.provider().unwrap().calls().is_empty());
}

#[tokio::test]
async fn connect__fails_when_wallet_exposes_no_accounts() {
    // given
    let provider = MockProvider::new();
    provider.set_accounts(Vec::new());
    let mut gateway = gateway(provider);

    // when
    let result = gateway.connect().await;

    // then
    assert!(matches!(result, Err(GatewayError::NoAccounts)));
    assert!(gateway.session().is_none());
    assert!(gateway.view().busy.is_empty());
}

#[tokio::test]
async fn refresh_balances__drops_session_after_account_switch() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    let other = alloy_primitives::Address::repeat_byte(0xcd);
    gateway.provider().unwrap().set_accounts(vec![other]);

    // when
    let result = gateway.refresh_balances().await;

    // then
    assert!(matches!(result, Err(GatewayError::NotConnected)));
    assert!(gateway.session().is_none());
    assert!(!gateway.view().wallet_panel_visible);
    assert!(gateway.view().connect_button_visible);
}

#[tokio::test]
async fn refresh_balances__updates_displayed_balances() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    let provider = gateway.provider().unwrap();
    provider.set_token_balance(one_ether() * U256::from(7u8));
    provider.set_balance(player(), one_ether() * U256::from(2u8));

    // when
    gateway.refresh_balances().await.unwrap();

    // then
    assert_eq!(gateway.view().token_balance, "7");
    assert_eq!(gateway.view().wallet_balance, "2.0000");
}
