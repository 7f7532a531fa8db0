#![allow(non_snake_case)]

use wallet_gateway::{
    GatewayError,
    provider::ProviderError,
    test_helpers::{
        MockProvider,
        gateway,
        token_address,
    },
    view::{
        Action,
        NoticeLevel,
    },
};

#[tokio::test]
async fn register_token__hands_token_metadata_to_wallet() {
    // given
    let mut gateway = gateway(MockProvider::new());

    // when
    gateway.register_token().await.unwrap();

    // then
    let watched = gateway.provider().unwrap().watched();
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0].address, token_address());
    assert_eq!(watched[0].symbol, "SABU");
    assert_eq!(watched[0].decimals, 18);
    let notice = gateway.view().latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Token added to wallet.");
}

#[tokio::test]
async fn register_token__declined_request_is_reported() {
    // given
    let provider = MockProvider::new();
    provider.set_watch_asset_accepted(false);
    let mut gateway = gateway(provider);

    // when
    let result = gateway.register_token().await;

    // then
    assert!(result.is_ok());
    assert_eq!(
        gateway.view().latest_notice().unwrap().message,
        "Failed to add token. Check your wallet settings."
    );
}

#[tokio::test]
async fn register_token__wallet_error_is_caught_and_reported() {
    // given
    let provider = MockProvider::new();
    provider.fail("wallet_watchAsset", ProviderError::user_rejected());
    let mut gateway = gateway(provider);

    // when
    let result = gateway.register_token().await;

    // then
    assert!(matches!(result, Err(GatewayError::Provider(_))));
    let notice = gateway.view().latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to add token. Check your wallet settings.");
    assert!(!gateway.view().is_busy(Action::WatchAsset));
}
