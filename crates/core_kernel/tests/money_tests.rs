//! Money and Rate behavior tests

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

#[test]
fn money_addition_same_currency() {
    let a = Money::new(dec!(10.25), Currency::EUR);
    let b = Money::new(dec!(5.75), Currency::EUR);
    assert_eq!((a + b).amount(), dec!(16.00));
}

#[test]
fn money_subtraction_can_go_negative() {
    let a = Money::new(dec!(10.00), Currency::EUR);
    let b = Money::new(dec!(25.00), Currency::EUR);
    let diff = a - b;
    assert!(diff.is_negative());
    assert_eq!(diff.amount(), dec!(-15.00));
}

#[test]
fn checked_ops_reject_cross_currency() {
    let usd = Money::new(dec!(1), Currency::USD);
    let jpy = Money::new(dec!(1), Currency::JPY);

    assert!(matches!(
        usd.checked_add(&jpy),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
    assert!(matches!(
        usd.checked_sub(&jpy),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn spec_tax_rounding_example() {
    // quantity 3, unit price 33.33, rate 0.15
    let unit_price = Money::new(dec!(33.33), Currency::USD);
    let line_total = unit_price.multiply(dec!(3));
    assert_eq!(line_total.amount(), dec!(99.99));

    let rate = Rate::new(dec!(0.15));
    let tax = rate.apply(&line_total).round_half_up(2);
    assert_eq!(tax.amount(), dec!(15.00));

    let total = line_total + tax;
    assert_eq!(total.amount(), dec!(114.99));
}

#[test]
fn jpy_has_no_minor_units() {
    let m = Money::new(dec!(100.4), Currency::JPY);
    assert_eq!(m.round_to_currency().amount(), dec!(100));
}

#[test]
fn rate_stored_at_four_decimal_places() {
    let rate = Rate::new(dec!(0.19251));
    assert_eq!(rate.as_decimal(), dec!(0.1925));
}

#[test]
fn zero_rate_yields_zero_tax() {
    let rate = Rate::zero();
    let base = Money::new(dec!(999.99), Currency::GBP);
    assert!(rate.apply(&base).is_zero());
}
