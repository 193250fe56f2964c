//! Monetary values, currencies, and rates.
//!
//! All amounts are `rust_decimal` values held at 4 decimal places, so
//! intermediate tax math never loses precision; fiscal rounding to the
//! currency's minor units happens explicitly at document boundaries.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use thiserror::Error;

/// ISO 4217 currencies the platform settles in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CHF,
    INR,
    AUD,
    SGD,
}

const CURRENCY_CODES: &[(Currency, &str)] = &[
    (Currency::USD, "USD"),
    (Currency::EUR, "EUR"),
    (Currency::GBP, "GBP"),
    (Currency::JPY, "JPY"),
    (Currency::CHF, "CHF"),
    (Currency::INR, "INR"),
    (Currency::AUD, "AUD"),
    (Currency::SGD, "SGD"),
];

impl Currency {
    /// Minor units: 2 for most currencies, 0 for JPY.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    pub fn code(&self) -> &'static str {
        CURRENCY_CODES
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, code)| *code)
            .unwrap_or("???")
    }

    pub fn from_code(code: &str) -> Result<Self, MoneyError> {
        CURRENCY_CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(currency, _)| *currency)
            .ok_or_else(|| MoneyError::UnknownCurrency(code.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// An amount bound to its currency.
///
/// Construction normalizes to 4 decimal places. Mixed-currency
/// arithmetic is a programming error: the `checked_*` methods surface it
/// as a typed error, the operator impls panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// From minor units: `from_minor(10050, EUR)` is 100.50 EUR.
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let scale = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / scale, currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// Half-up rounding to `dp` places. Tax law rounds .5 away from
    /// zero; half-even would under-state tax on exact midpoints.
    pub fn round_half_up(&self, dp: u32) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                dp,
                rust_decimal::RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Half-up rounding to the currency's minor units.
    pub fn round_to_currency(&self) -> Self {
        self.round_half_up(self.currency.decimal_places())
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ))
        }
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Scalar multiplication, for quantities and rates.
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.amount * factor, self.currency)
    }

    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.amount / divisor, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places() as usize;
        write!(f, "{} {:.dp$}", self.currency.code(), self.amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount, self.currency)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        self.multiply(factor)
    }
}

impl Div<Decimal> for Money {
    type Output = Self;

    fn div(self, divisor: Decimal) -> Self {
        self.divide(divisor).expect("Division by zero in Money::div")
    }
}

/// A fractional rate, held at 4 decimal places to match published VAT
/// tables (0.1925 for 19.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    value: Decimal,
}

impl Rate {
    /// From a decimal fraction: `Rate::new(dec!(0.20))` is 20%.
    pub fn new(value: Decimal) -> Self {
        Self {
            value: value.round_dp(4),
        }
    }

    /// From a percentage: `Rate::from_percentage(dec!(20))` is 20%.
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self::new(percentage / dec!(100))
    }

    pub fn zero() -> Self {
        Self { value: dec!(0) }
    }

    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The raw product; callers decide when to round.
    pub fn apply(&self, money: &Money) -> Money {
        money.multiply(self.value)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_to_four_places() {
        let m = Money::new(dec!(10.123456), Currency::EUR);
        assert_eq!(m.amount(), dec!(10.1235));
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_minor_units_respect_the_currency() {
        assert_eq!(Money::from_minor(10050, Currency::EUR).amount(), dec!(100.50));
        // JPY has no minor units
        assert_eq!(Money::from_minor(500, Currency::JPY).amount(), dec!(500));
    }

    #[test]
    fn test_same_currency_arithmetic() {
        let a = Money::new(dec!(70.25), Currency::EUR);
        let b = Money::new(dec!(29.75), Currency::EUR);

        assert_eq!((a + b).amount(), dec!(100.00));
        assert_eq!((a - b).amount(), dec!(40.50));
        assert_eq!((-a).amount(), dec!(-70.25));
    }

    #[test]
    fn test_mixed_currencies_are_a_typed_error() {
        let eur = Money::new(dec!(10.00), Currency::EUR);
        let gbp = Money::new(dec!(10.00), Currency::GBP);

        assert!(matches!(
            eur.checked_add(&gbp),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
        assert!(matches!(
            eur.checked_sub(&gbp),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_half_up_rounds_midpoints_away_from_zero() {
        assert_eq!(
            Money::new(dec!(19.998), Currency::EUR).round_half_up(2).amount(),
            dec!(20.00)
        );
        assert_eq!(
            Money::new(dec!(0.005), Currency::EUR).round_half_up(2).amount(),
            dec!(0.01)
        );
        assert_eq!(
            Money::new(dec!(-0.005), Currency::EUR).round_half_up(2).amount(),
            dec!(-0.01)
        );
    }

    #[test]
    fn test_round_to_currency_uses_minor_units() {
        assert_eq!(
            Money::new(dec!(12.345), Currency::EUR).round_to_currency().amount(),
            dec!(12.35)
        );
        assert_eq!(
            Money::new(dec!(12.5), Currency::JPY).round_to_currency().amount(),
            dec!(13)
        );
    }

    #[test]
    fn test_rate_applies_without_rounding() {
        let vat = Rate::from_percentage(dec!(20));
        let line = Money::new(dec!(99.99), Currency::EUR);

        let tax = vat.apply(&line);
        assert_eq!(tax.amount(), dec!(19.998));
        assert_eq!(tax.round_to_currency().amount(), dec!(20.00));
    }

    #[test]
    fn test_currency_codes_round_trip() {
        for (currency, code) in CURRENCY_CODES {
            assert_eq!(Currency::from_code(code).unwrap(), *currency);
            assert_eq!(currency.code(), *code);
        }
        assert!(matches!(
            Currency::from_code("XTS"),
            Err(MoneyError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_display_formats_minor_units() {
        assert_eq!(Money::new(dec!(1234.5), Currency::EUR).to_string(), "EUR 1234.50");
        assert_eq!(Money::new(dec!(500), Currency::JPY).to_string(), "JPY 500");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn addition_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let (ma, mb, mc) = (
                Money::from_minor(a, Currency::EUR),
                Money::from_minor(b, Currency::EUR),
                Money::from_minor(c, Currency::EUR),
            );
            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }

        #[test]
        fn half_up_moves_at_most_half_a_minor_unit(
            raw in -1_000_000_000i64..1_000_000_000i64
        ) {
            let m = Money::new(Decimal::new(raw, 4), Currency::EUR);
            let shift = (m.round_half_up(2).amount() - m.amount()).abs();
            prop_assert!(shift <= Decimal::new(5, 3));
        }

        #[test]
        fn half_up_is_idempotent(raw in -1_000_000_000i64..1_000_000_000i64) {
            let rounded = Money::new(Decimal::new(raw, 4), Currency::EUR).round_half_up(2);
            prop_assert_eq!(rounded.round_half_up(2), rounded);
        }
    }
}
