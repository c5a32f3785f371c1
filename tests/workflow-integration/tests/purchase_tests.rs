//! Purchase scenarios run end to end against the in-memory market.

use std::time::Duration;

use vintner_client::config::ClientConfig;
use vintner_client::error::{ProviderError, TransactionStage};
use vintner_client::mock::MockWallet;
use vintner_client::provider::{
    BuyCall, MarketplaceContract, PendingOperation, Route, Severity,
};
use vintner_client::purchase::PurchaseError;
use vintner_common::catalogue::{Address, TokenId};
use vintner_common::currency::Mutez;
use vintner_common::purchase::{PurchaseState, QuantityError};

use vintner_workflow_integration::harness::TestHarness;
use vintner_workflow_integration::{
    init_tracing, seeded_market, BUYER, BUYER_BALANCE, CHATEAU, DOMAINE,
};

#[tokio::test]
async fn connect_browse_and_buy() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;

    h.connect().await.expect("wallet connects");
    assert_eq!(h.routes(), &[Route::Catalog]);
    assert_eq!(h.ctx.session().balance, BUYER_BALANCE);

    // The sold-out Pauillac bid is not offered.
    let cards = h.ctx.catalogue().cards();
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|c| c.avatar != "1"));
    let chablis = cards.iter().find(|c| c.avatar == "2").unwrap();
    assert_eq!(chablis.body, "Bid : 4 at price 0.75");
    assert_eq!(chablis.title.as_deref(), Some("Chablis 2021"));

    let settlement = h.buy(CHATEAU, 0, "3").await.expect("purchase settles");

    assert_eq!(settlement.request.total_cost, Mutez(6_000_000));
    assert_eq!(h.market.buy_calls().len(), 1);
    assert_eq!(h.market.buy_calls()[0].amount, Mutez(6_000_000));
    assert_eq!(h.market.confirmation_requests(), vec![2]);

    let notes = h.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Success);
    assert!(notes[0].message.contains('3'));
    assert!(notes[0].message.contains("token_id:0"));

    // Context was reloaded with the post-trade state.
    assert_eq!(h.ctx.session().balance, Mutez(44_000_000));
    let chateau = h
        .ctx
        .catalogue()
        .visible_entries()
        .into_iter()
        .find(|e| e.token_id == TokenId(0))
        .unwrap();
    assert_eq!(chateau.quantity, 7);
    assert_eq!(h.market.balance(CHATEAU), Mutez(6_000_000));
}

#[tokio::test]
async fn zero_quantity_is_rejected_before_the_network() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");
    let loads = h.market.load_count();

    let err = h.buy(CHATEAU, 0, "0").await.unwrap_err();

    assert_eq!(err.to_string(), "ERROR: The number must be greater than 0!");
    assert_eq!(h.workflow.state(), &PurchaseState::Idle);
    assert!(h.market.buy_calls().is_empty());
    assert_eq!(h.market.load_count(), loads);
    assert!(h.notifications().is_empty());
}

#[tokio::test]
async fn malformed_quantities_never_submit() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");
    h.select(DOMAINE, 2).unwrap();

    let cases = [
        ("", QuantityError::Required),
        ("a dozen", QuantityError::Required),
        ("-2", QuantityError::NotPositive),
        ("0", QuantityError::NotPositive),
        ("1.5", QuantityError::NotWhole),
        ("5", QuantityError::ExceedsAvailable { available: 4 }),
    ];
    for (input, expected) in cases {
        let err = h.submit(input).await.unwrap_err();
        assert_eq!(err, PurchaseError::Validation(expected.clone()), "input {input:?}");
        assert_eq!(h.workflow.field_error(), Some(&expected));
    }

    assert!(h.market.buy_calls().is_empty());

    // A valid entry afterwards clears the field error and goes through.
    h.submit("4").await.expect("purchase settles");
    assert!(h.workflow.field_error().is_none());
    assert_eq!(h.market.buy_calls()[0].amount, Mutez(3_000_000));
}

#[tokio::test]
async fn confirmation_failure_leaves_context_untouched() {
    init_tracing();
    let market =
        seeded_market().failing_confirmation(ProviderError::unreachable("confirmation timed out"));
    let mut h = TestHarness::start(market).await;
    h.connect().await.expect("wallet connects");

    let session_before = h.ctx.session().clone();
    let catalogue_before = h.ctx.catalogue().clone();
    let loads = h.market.load_count();

    let err = h.buy(CHATEAU, 0, "2").await.unwrap_err();

    match err {
        PurchaseError::Transaction(tx) => {
            assert_eq!(tx.stage, TransactionStage::Confirmation);
            assert_eq!(tx.data_message, "confirmation timed out");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(matches!(h.workflow.state(), PurchaseState::Failed { .. }));
    assert_eq!(h.market.buy_calls().len(), 1);
    assert_eq!(h.market.load_count(), loads);
    assert_eq!(h.ctx.session(), &session_before);
    assert_eq!(h.ctx.catalogue(), &catalogue_before);

    let notes = h.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Error);
    assert_eq!(notes[0].message, "confirmation timed out");
    assert_eq!(notes[0].auto_hide, Some(Duration::from_secs(10)));
}

#[tokio::test]
async fn one_refresh_per_settlement_and_none_per_failure() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");
    let start = h.market.load_count();

    h.buy(CHATEAU, 0, "1").await.expect("first settles");
    h.buy(DOMAINE, 2, "1").await.expect("second settles");
    assert_eq!(h.market.load_count(), start + 2);

    // The wallet refuses the next injection.
    h.market.fail_next_submission(ProviderError::aborted("Aborted by user"));
    let err = h.buy(CHATEAU, 0, "2").await.unwrap_err();
    assert!(matches!(err, PurchaseError::Transaction(_)));
    assert_eq!(h.market.load_count(), start + 2);

    // Retrying is a fresh attempt.
    h.buy(CHATEAU, 0, "2").await.expect("retry settles");
    assert_eq!(h.market.load_count(), start + 3);
    assert_eq!(h.market.buy_calls().len(), 4);
    assert_eq!(h.market.bid(CHATEAU, TokenId(0)).unwrap().quantity, 7);
}

#[tokio::test]
async fn stale_catalogue_is_refused_by_the_contract() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");

    // Someone else buys three Chablis; our catalogue still says four.
    let side = BuyCall {
        token_id: TokenId(2),
        quantity: 3,
        seller: Address::new(DOMAINE),
        amount: Mutez(2_250_000),
    };
    let op = h.market.buy(&side).await.expect("side purchase accepted");
    op.confirmation(2).await.expect("side purchase confirmed");
    assert_eq!(h.market.bid(DOMAINE, TokenId(2)).unwrap().quantity, 1);

    let err = h.buy(DOMAINE, 2, "4").await.unwrap_err();
    match err {
        PurchaseError::Transaction(tx) => {
            assert_eq!(tx.stage, TransactionStage::Submission);
            assert_eq!(tx.data_message, "NOT_ENOUGH_QUANTITY");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(h.notifications()[0].message, "NOT_ENOUGH_QUANTITY");
}

#[tokio::test]
async fn configured_confirmation_depth_is_used() {
    init_tracing();
    let mut config = ClientConfig::default();
    config.workflow.confirmation_depth = 5;
    config.workflow.error_notice_ms = 3_000;
    let mut h = TestHarness::start_with(seeded_market(), MockWallet::new(BUYER), config).await;
    h.connect().await.expect("wallet connects");

    let settlement = h.buy(CHATEAU, 0, "1").await.expect("purchase settles");
    assert_eq!(settlement.depth, 5);
    assert_eq!(h.market.confirmation_requests(), vec![5]);
}

#[tokio::test]
async fn failed_refresh_does_not_undo_settlement() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");
    let catalogue_before = h.ctx.catalogue().clone();

    h.market.fail_loads(ProviderError::unreachable("indexer down"));

    let settlement = h.buy(CHATEAU, 0, "1").await.expect("purchase settles");
    assert!(matches!(h.workflow.state(), PurchaseState::Settled { .. }));
    assert_eq!(settlement.request.quantity, 1);
    // The reload failed, so the local catalogue is the pre-trade one.
    assert_eq!(h.ctx.catalogue(), &catalogue_before);
    assert_eq!(h.market.bid(CHATEAU, TokenId(0)).unwrap().quantity, 9);
}

#[tokio::test]
async fn sold_out_bid_cannot_be_selected() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");

    let err = h.select(CHATEAU, 1).unwrap_err();
    assert_eq!(err, PurchaseError::SoldOut);
    assert!(h.workflow.selected().is_none());
}

#[tokio::test]
async fn resubmitting_checks_the_refreshed_bid() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");

    h.select(CHATEAU, 0).unwrap();
    h.submit("3").await.expect("first purchase settles");

    // Same selection, no reselect: ten were on offer, seven are left.
    let err = h.submit("10").await.unwrap_err();
    assert_eq!(
        err,
        PurchaseError::Validation(QuantityError::ExceedsAvailable { available: 7 })
    );
    assert_eq!(h.market.buy_calls().len(), 1);
    assert_eq!(h.workflow.selected().map(|e| e.quantity), Some(7));

    h.submit("7").await.expect("remaining units settle");
    assert_eq!(h.market.buy_calls().len(), 2);
    assert_eq!(h.market.bid(CHATEAU, TokenId(0)).unwrap().quantity, 0);
}

#[tokio::test]
async fn buying_out_a_bid_ends_the_selection() {
    init_tracing();
    let mut h = TestHarness::start(seeded_market()).await;
    h.connect().await.expect("wallet connects");

    h.select(DOMAINE, 2).unwrap();
    h.submit("4").await.expect("whole bid settles");
    assert!(h.ctx.catalogue().visible_entries().iter().all(|e| e.token_id != TokenId(2)));

    let err = h.submit("1").await.unwrap_err();
    assert_eq!(err, PurchaseError::SoldOut);
    assert!(h.workflow.selected().is_none());
    assert_eq!(h.market.buy_calls().len(), 1);
}
