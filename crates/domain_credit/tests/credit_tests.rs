//! Credit domain tests for the entity layer; guard behavior against a
//! store is covered by the workspace integration tests.

use core_kernel::{AccountId, Currency, Money};
use domain_credit::{CreditDunningEvent, CreditLimit, OverLimitPolicy};
use rust_decimal_macros::dec;

fn eur(amount: &str) -> Money {
    Money::new(amount.parse().unwrap(), Currency::EUR)
}

#[test]
fn test_fresh_line_has_full_headroom() {
    let limit = CreditLimit::open(AccountId::new(), eur("5000.00"));
    assert_eq!(limit.available(), eur("5000.00"));
    assert!(limit.current_balance.is_zero());
    assert!(limit.is_active);
}

#[test]
fn test_overage_reported_when_balance_exceeds_limit() {
    let mut limit = CreditLimit::open(AccountId::new(), eur("1000.00"));
    limit.current_balance = eur("1250.00");

    assert!(limit.available().is_zero());
    assert_eq!(limit.overage().unwrap().amount(), dec!(250.00));
}

#[test]
fn test_cost_center_scoping() {
    let limit = CreditLimit::open(AccountId::new(), eur("1000.00")).with_cost_center("CC-EMEA-7");
    assert_eq!(limit.cost_center_id.as_deref(), Some("CC-EMEA-7"));
}

#[test]
fn test_default_policy_allows_and_flags() {
    assert_eq!(OverLimitPolicy::default(), OverLimitPolicy::AllowAndFlag);
}

#[test]
fn test_dunning_event_resolution_keeps_first_resolver() {
    let limit = CreditLimit::open(AccountId::new(), eur("1000.00"));
    let mut event = CreditDunningEvent::record(limit.id, limit.account_id, eur("99.00"));

    event.resolve("collections", None);
    event.resolve("intruder", Some("overwrite attempt".to_string()));

    assert!(event.resolved);
    assert_eq!(event.resolved_by.as_deref(), Some("collections"));
    assert!(event.resolution_notes.is_none());
}
