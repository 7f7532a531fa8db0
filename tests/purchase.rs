#![allow(non_snake_case)]

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use wallet_gateway::{
    GatewayError,
    contracts::ITokenSale,
    provider::ProviderError,
    test_helpers::{
        MockProvider,
        connected_gateway,
        gateway,
        token_address,
    },
    view::{
        Action,
        NoticeLevel,
    },
};

#[tokio::test]
async fn purchase_tokens__sends_count_times_unit_price() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;

    // when
    gateway.purchase_tokens("50").await.unwrap();

    // then
    let sent = gateway.provider().unwrap().sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert_eq!(tx.to, token_address());
    assert_eq!(tx.value, Some(U256::from(5_000_000_000_000_000u64)));
    let call = ITokenSale::purchaseTokensCall::abi_decode(&tx.data, true).unwrap();
    assert_eq!(call.count, U256::from(50u8));
    let notice = gateway.view().latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Mint Success!");
}

#[tokio::test]
async fn purchase_tokens__requires_connected_session() {
    // given
    let mut gateway = gateway(MockProvider::new());

    // when
    let result = gateway.purchase_tokens("5").await;

    // then
    assert!(matches!(result, Err(GatewayError::NotConnected)));
    assert!(gateway.provider().unwrap().sent().is_empty());
    assert_eq!(
        gateway.view().latest_notice().unwrap().message,
        "Please connect your wallet first"
    );
}

#[tokio::test]
async fn purchase_tokens__rejects_zero_fractional_and_empty_input() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;

    // when
    let results = [
        gateway.purchase_tokens("0").await,
        gateway.purchase_tokens("").await,
        gateway.purchase_tokens("2.5").await,
        gateway.purchase_tokens("ten").await,
    ];

    // then
    for result in results {
        assert!(matches!(result, Err(GatewayError::InvalidAmount { .. })));
    }
    assert!(gateway.provider().unwrap().sent().is_empty());
}

#[tokio::test]
async fn purchase_tokens__drops_session_after_account_switch() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    let other = alloy_primitives::Address::repeat_byte(0xcd);
    gateway.provider().unwrap().set_accounts(vec![other]);

    // when
    let result = gateway.purchase_tokens("5").await;

    // then
    assert!(matches!(result, Err(GatewayError::NotConnected)));
    assert!(gateway.session().is_none());
    assert!(!gateway.view().wallet_panel_visible);
    assert!(gateway.view().connect_button_visible);
    assert!(gateway.provider().unwrap().sent().is_empty());
    assert!(!gateway.view().is_busy(Action::Purchase));
}

#[tokio::test]
async fn purchase_tokens__wallet_rejection_warns_without_retry() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway
        .provider()
        .unwrap()
        .fail("eth_sendTransaction", ProviderError::user_rejected());

    // when
    let result = gateway.purchase_tokens("3").await;

    // then
    assert!(matches!(result, Err(GatewayError::Provider(_))));
    let notice = gateway.view().latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Please connect your wallet first");
    assert!(!gateway.view().is_busy(Action::Purchase));
}

#[tokio::test]
async fn purchase_tokens__reverted_receipt_is_reported() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway.provider().unwrap().set_receipt_success(false);

    // when
    let result = gateway.purchase_tokens("3").await;

    // then
    assert!(matches!(result, Err(GatewayError::Reverted(_))));
    assert_ne!(gateway.view().latest_notice().unwrap().message, "Mint Success!");
}

#[tokio::test]
async fn purchase_tokens__gives_up_after_receipt_attempts() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway.provider().unwrap().set_pending_polls(10);

    // when
    let result = gateway.purchase_tokens("1").await;

    // then
    assert!(matches!(
        result,
        Err(GatewayError::ReceiptTimeout { attempts: 3, .. })
    ));
}

#[tokio::test]
async fn purchase_tokens__waits_for_pending_receipt() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway.provider().unwrap().set_pending_polls(2);

    // when
    let result = gateway.purchase_tokens("1").await;

    // then
    assert!(result.is_ok());
}

#[test]
fn update_mint_amount__labels_required_payment() {
    // given
    let mut gateway = gateway(MockProvider::new());

    // when
    gateway.update_mint_amount("50");

    // then
    assert_eq!(gateway.view().mint_amount_input, "50");
    assert_eq!(gateway.view().required_payment, "Required ETH: 0.0050 + gas fee");

    // when
    gateway.update_mint_amount("5x");

    // then
    assert_eq!(gateway.view().required_payment, "Required ETH:");
}

#[tokio::test]
async fn load_supply__shows_raw_supply_figures() {
    // given
    let provider = MockProvider::new();
    provider.set_supply(U256::from(1_234u64), U256::from(10_000u64));
    let mut gateway = gateway(provider);

    // when
    gateway.load_supply().await.unwrap();

    // then
    assert_eq!(gateway.view().total_supply, "1234");
    assert_eq!(gateway.view().max_supply, "10000");
}
