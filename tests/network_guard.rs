#![allow(non_snake_case)]

use wallet_gateway::{
    GatewayError,
    test_helpers::{
        MockProvider,
        connected_gateway,
        gateway,
    },
    view::{
        CardSide,
        NoticeLevel,
        RoundPhase,
    },
};

const POLYGON: u64 = 137;

#[tokio::test]
async fn check_network__reports_no_mismatch_on_expected_chain() {
    let mut gateway = gateway(MockProvider::new());
    assert!(!gateway.check_network().await.unwrap());
    assert!(gateway.view().notices.is_empty());
}

#[tokio::test]
async fn check_network__flags_mismatch_and_warns() {
    // given
    let provider = MockProvider::new();
    provider.set_chain_id(POLYGON);
    let mut gateway = gateway(provider);

    // when
    let mismatch = gateway.check_network().await.unwrap();

    // then
    assert!(mismatch);
    let notice = gateway.view().latest_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(
        notice.message,
        "Please connect to the correct network (Polygon Mumbai)."
    );
}

#[tokio::test]
async fn connect__aborts_on_wrong_network() {
    // given
    let provider = MockProvider::new();
    provider.set_chain_id(POLYGON);
    let mut gateway = gateway(provider);

    // when
    let result = gateway.connect().await;

    // then
    assert!(matches!(
        result,
        Err(GatewayError::WrongNetwork {
            expected: 80001,
            actual: POLYGON
        })
    ));
    assert!(gateway.session().is_none());
    assert!(!gateway.view().wallet_panel_visible);
}

#[tokio::test]
async fn mutating_operations__submit_nothing_on_wrong_network() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway.provider().unwrap().set_chain_id(POLYGON);

    // when
    let purchase = gateway.purchase_tokens("10").await;
    let box_start = gateway.start_random_box().await;
    let card_start = gateway.start_card_game().await;

    // then
    for result in [purchase.map(|_| ()), box_start, card_start] {
        assert!(matches!(result, Err(GatewayError::WrongNetwork { .. })));
    }
    assert!(gateway.provider().unwrap().sent().is_empty());
    assert_eq!(gateway.view().random_box.phase, RoundPhase::Idle);
    assert_eq!(gateway.view().card_game.phase, RoundPhase::Idle);
    assert!(gateway.view().busy.is_empty());
}

#[tokio::test]
async fn play_card__submits_nothing_after_network_switch() {
    // given
    let mut gateway = connected_gateway(MockProvider::new()).await;
    gateway.start_card_game().await.unwrap();
    gateway.provider().unwrap().set_chain_id(POLYGON);

    // when
    let result = gateway.play_card(CardSide::Red).await;

    // then
    assert!(matches!(result, Err(GatewayError::WrongNetwork { .. })));
    let sent = gateway.provider().unwrap().sent();
    assert_eq!(sent.len(), 1, "only the entry fee transfer");
    assert_eq!(gateway.view().card_game.phase, RoundPhase::EntryFeePaid);
}

#[tokio::test]
async fn load_supply__refuses_wrong_network() {
    // given
    let provider = MockProvider::new();
    provider.set_chain_id(POLYGON);
    let mut gateway = gateway(provider);

    // when
    let result = gateway.load_supply().await;

    // then
    assert!(matches!(result, Err(GatewayError::WrongNetwork { .. })));
    assert!(gateway.provider().unwrap().calls().is_empty());
    assert_eq!(gateway.view().total_supply, "");
}
