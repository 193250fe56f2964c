//! Credit limit guard flows over the in-memory store: both over-limit
//! policies, settlement clamping, and dunning resolution.

use std::sync::Arc;

use core_kernel::{Currency, Money};
use domain_credit::{CreditError, CreditLimitGuard, CreditStore, OverLimitPolicy};
use rust_decimal_macros::dec;
use test_utils::{CreditLimitBuilder, IdFixtures, MemoryCreditStore};

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

async fn guard_with_policy(policy: OverLimitPolicy) -> (CreditLimitGuard, Arc<MemoryCreditStore>) {
    let store = Arc::new(MemoryCreditStore::new());
    store
        .open(CreditLimitBuilder::new().build())
        .await
        .unwrap();
    (CreditLimitGuard::new(store.clone(), policy), store)
}

async fn guard() -> (CreditLimitGuard, Arc<MemoryCreditStore>) {
    guard_with_policy(OverLimitPolicy::AllowAndFlag).await
}

#[tokio::test]
async fn test_availability_checks_the_headroom_boundary() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    assert!(guard
        .has_available_credit(account, &eur(dec!(5000.00)))
        .await
        .unwrap());
    assert!(!guard
        .has_available_credit(account, &eur(dec!(5000.01)))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_account_without_a_line_has_no_credit() {
    let (guard, _) = guard().await;

    assert!(!guard
        .has_available_credit(IdFixtures::vendor_id(), &eur(dec!(1.00)))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_increase_within_limit_records_no_event() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    let limit = guard.increase_used(account, eur(dec!(3000.00))).await.unwrap();

    assert_eq!(limit.current_balance.amount(), dec!(3000.00));
    assert_eq!(limit.available().amount(), dec!(2000.00));
    assert!(guard.active_dunning_events(account).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_allow_and_flag_accepts_the_overshoot_and_records_dunning() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    let limit = guard.increase_used(account, eur(dec!(5200.00))).await.unwrap();

    assert_eq!(limit.current_balance.amount(), dec!(5200.00));
    assert!(limit.available().is_zero());
    assert_eq!(limit.overage().unwrap().amount(), dec!(200.00));

    let events = guard.active_dunning_events(account).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].amount_over.amount(), dec!(200.00));
    assert!(!events[0].resolved);
}

#[tokio::test]
async fn test_hard_block_refuses_but_still_records_dunning() {
    let (guard, _) = guard_with_policy(OverLimitPolicy::HardBlock).await;
    let account = IdFixtures::buyer_id();

    let error = guard
        .increase_used(account, eur(dec!(5200.00)))
        .await
        .unwrap_err();
    match error {
        CreditError::LimitExceeded {
            available,
            requested,
        } => {
            assert_eq!(available.amount(), dec!(5000.00));
            assert_eq!(requested.amount(), dec!(5200.00));
        }
        other => panic!("Expected LimitExceeded, got {:?}", other),
    }

    // The balance stays untouched, but collections hears about the
    // refused attempt.
    let line = guard.credit_line(account).await.unwrap();
    assert!(line.current_balance.is_zero());

    let events = guard.active_dunning_events(account).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].amount_over.amount(), dec!(200.00));
    assert!(!events[0].resolved);
}

#[tokio::test]
async fn test_hard_block_still_accepts_exact_headroom() {
    let (guard, _) = guard_with_policy(OverLimitPolicy::HardBlock).await;
    let account = IdFixtures::buyer_id();

    let limit = guard.increase_used(account, eur(dec!(5000.00))).await.unwrap();
    assert_eq!(limit.current_balance.amount(), dec!(5000.00));
    assert!(limit.available().is_zero());
}

#[tokio::test]
async fn test_settlement_clamps_at_zero() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    guard.increase_used(account, eur(dec!(400.00))).await.unwrap();
    let limit = guard
        .decrease_used(account, eur(dec!(1000.00)))
        .await
        .unwrap();

    assert!(limit.current_balance.is_zero());
    assert_eq!(limit.available().amount(), dec!(5000.00));
}

#[tokio::test]
async fn test_inactive_line_refuses_new_exposure() {
    let store = Arc::new(MemoryCreditStore::new());
    store
        .open(CreditLimitBuilder::new().inactive().build())
        .await
        .unwrap();
    let guard = CreditLimitGuard::new(store, OverLimitPolicy::AllowAndFlag);
    let account = IdFixtures::buyer_id();

    assert!(!guard
        .has_available_credit(account, &eur(dec!(1.00)))
        .await
        .unwrap());
    assert!(guard.increase_used(account, eur(dec!(1.00))).await.is_err());
}

#[tokio::test]
async fn test_duplicate_line_for_an_account_is_refused() {
    let (_, store) = guard().await;

    let result = store.open(CreditLimitBuilder::new().build()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_resolving_a_dunning_event_is_idempotent() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    guard.increase_used(account, eur(dec!(5200.00))).await.unwrap();
    let event_id = guard.active_dunning_events(account).await.unwrap()[0].id;

    let resolved = guard
        .resolve_event(event_id, "ops@marketplace", Some("Paid down".to_string()))
        .await
        .unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_by.as_deref(), Some("ops@marketplace"));

    // Replaying the resolution keeps the original resolver and notes.
    let replayed = guard
        .resolve_event(event_id, "someone-else", None)
        .await
        .unwrap();
    assert_eq!(replayed.resolved_by.as_deref(), Some("ops@marketplace"));
    assert_eq!(replayed.resolution_notes.as_deref(), Some("Paid down"));

    assert!(guard.active_dunning_events(account).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_amounts_are_rejected_everywhere() {
    let (guard, _) = guard().await;
    let account = IdFixtures::buyer_id();

    assert!(guard
        .has_available_credit(account, &eur(dec!(-1.00)))
        .await
        .is_err());
    assert!(guard.increase_used(account, eur(dec!(0.00))).await.is_err());
    assert!(guard.decrease_used(account, eur(dec!(-5.00))).await.is_err());
}
