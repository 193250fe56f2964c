//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::{AccountId, Currency, Money, OrderId, ProductId, Rate};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::CHF),
        Just(Currency::INR),
        Just(Currency::AUD),
        Just(Currency::SGD),
    ]
}

/// Strategy for generating positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating positive EUR Money values
pub fn eur_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::EUR))
}

/// Strategy for generating tax rates between 0% and 100%, 4 decimal places
pub fn rate_strategy() -> impl Strategy<Value = Rate> {
    (0u32..=10000u32).prop_map(|n| Rate::new(Decimal::new(n as i64, 4)))
}

/// Strategy for generating realistic unit prices (0.01 to 10000.00)
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating line quantities
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    1u32..1000u32
}

/// Strategy for generating counter starting values
pub fn counter_value_strategy() -> impl Strategy<Value = i64> {
    0i64..10_000_000i64
}

/// Strategy for generating document number format patterns
pub fn format_pattern_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("INV-NNNNNNN".to_string()),
        Just("NNNNN/24".to_string()),
        Just("B-NNN".to_string()),
        Just("NNNNNNN".to_string()),
    ]
}

/// Strategy for generating tax classes
pub fn tax_class_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("STANDARD".to_string()),
        Just("REDUCED".to_string()),
        Just("EXEMPT".to_string()),
    ]
}

/// Strategy for generating ISO country codes used in tax fixtures
pub fn country_code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("FR".to_string()),
        Just("DE".to_string()),
        Just("ES".to_string()),
        Just("IT".to_string()),
        Just("GB".to_string()),
    ]
}

/// Strategy for generating idempotency keys
pub fn idempotency_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{8}-[a-z0-9]{4}".prop_map(|s| format!("idem-{}", s))
}

/// Strategy for generating AccountId
pub fn account_id_strategy() -> impl Strategy<Value = AccountId> {
    any::<[u8; 16]>().prop_map(|bytes| AccountId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating OrderId
pub fn order_id_strategy() -> impl Strategy<Value = OrderId> {
    any::<[u8; 16]>().prop_map(|bytes| OrderId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for generating ProductId
pub fn product_id_strategy() -> impl Strategy<Value = ProductId> {
    any::<[u8; 16]>().prop_map(|bytes| ProductId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn positive_money_is_always_positive(money in positive_money_strategy()) {
            prop_assert!(money.amount() > Decimal::ZERO);
        }

        #[test]
        fn rate_is_a_valid_fraction(rate in rate_strategy()) {
            prop_assert!(rate.as_decimal() >= Decimal::ZERO);
            prop_assert!(rate.as_decimal() <= Decimal::ONE);
        }

        #[test]
        fn unit_prices_have_minor_unit_precision(price in unit_price_strategy()) {
            prop_assert!(price > Decimal::ZERO);
            prop_assert!(price.scale() <= 2);
        }

        #[test]
        fn idempotency_keys_are_prefixed(key in idempotency_key_strategy()) {
            prop_assert!(key.starts_with("idem-"));
        }
    }
}
