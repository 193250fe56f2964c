//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the financial
//! core. These fixtures are designed to be consistent and predictable for
//! unit tests.

use chrono::NaiveDate;
use core_kernel::{
    AccountId, Currency, DocumentId, EffectivePeriod, EstablishmentId, Money, OrderId, ProductId,
    Rate, WalletId,
};
use domain_invoicing::{tax_class, Establishment, SequenceCounter, TaxRate, INVOICE_SEQUENCE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates a standard EUR amount for testing
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    /// Creates a typical order total
    pub fn eur_order_total() -> Money {
        Money::new(dec!(250.00), Currency::EUR)
    }

    /// Creates a typical approved credit limit
    pub fn eur_credit_limit() -> Money {
        Money::new(dec!(5000.00), Currency::EUR)
    }

    /// Creates a zero amount
    pub fn eur_zero() -> Money {
        Money::zero(Currency::EUR)
    }

    /// Creates a USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Creates a JPY amount (zero decimal places)
    pub fn jpy_10000() -> Money {
        Money::new(dec!(10000), Currency::JPY)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard issue date for documents (Jun 15, 2024)
    pub fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// Standard due date, 30 days after the issue date
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    /// Start of the standard tax rate's effective range
    pub fn rate_effective_from() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    /// A date before any fixture rate is effective
    pub fn before_rates() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
    }

    /// An open-ended effective period starting at the standard date
    pub fn open_effective_period() -> EffectivePeriod {
        EffectivePeriod::starting(Self::rate_effective_from())
    }

    /// A bounded effective period covering 2020 through 2024
    pub fn bounded_effective_period() -> EffectivePeriod {
        EffectivePeriod::new(
            Self::rate_effective_from(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic establishment ID for testing
    pub fn establishment_id() -> EstablishmentId {
        EstablishmentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Creates a deterministic document ID for testing
    pub fn document_id() -> DocumentId {
        DocumentId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic buyer account ID for testing
    pub fn buyer_id() -> AccountId {
        AccountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// Creates a deterministic vendor account ID for testing
    pub fn vendor_id() -> AccountId {
        AccountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }

    /// Creates a deterministic order ID for testing
    pub fn order_id() -> OrderId {
        OrderId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440005").unwrap())
    }

    /// Creates a deterministic product ID for testing
    pub fn product_id() -> ProductId {
        ProductId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440006").unwrap())
    }

    /// Creates a deterministic wallet ID for testing
    pub fn wallet_id() -> WalletId {
        WalletId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440007").unwrap())
    }
}

/// Fixture for decimal test data
pub struct DecimalFixtures;

impl DecimalFixtures {
    /// French standard VAT rate (20%)
    pub fn standard_vat() -> Decimal {
        dec!(0.20)
    }

    /// French reduced VAT rate (5.5%)
    pub fn reduced_vat() -> Decimal {
        dec!(0.055)
    }

    /// Unit price that produces rounding-sensitive tax amounts
    pub fn awkward_unit_price() -> Decimal {
        dec!(33.33)
    }

    /// Zero for comparison tests
    pub fn zero() -> Decimal {
        Decimal::ZERO
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// Standard country code for tax fixtures
    pub fn country_code() -> &'static str {
        "FR"
    }

    /// Standard purchase order number
    pub fn po_number() -> &'static str {
        "PO-2024-000042"
    }

    /// Standard product name
    pub fn product_name() -> &'static str {
        "Industrial Widget"
    }

    /// Standard idempotency key
    pub fn idempotency_key() -> &'static str {
        "idem-test-0001"
    }

    /// Standard credit note reason
    pub fn credit_reason() -> &'static str {
        "Goods returned"
    }
}

/// Fixture for domain entity test data
pub struct DomainFixtures;

impl DomainFixtures {
    /// An active French establishment with the deterministic fixture ID
    pub fn establishment() -> Establishment {
        Establishment::new(
            IdFixtures::establishment_id(),
            "Acme Marketplace SAS",
            StringFixtures::country_code(),
        )
        .with_tax_id("FR12345678901")
    }

    /// The French standard 20% VAT rate, effective from 2020, open-ended
    pub fn standard_tax_rate() -> TaxRate {
        TaxRate::new(
            StringFixtures::country_code(),
            tax_class::STANDARD,
            Rate::new(DecimalFixtures::standard_vat()),
            TemporalFixtures::open_effective_period(),
        )
    }

    /// The French reduced 5.5% VAT rate, effective from 2020, open-ended
    pub fn reduced_tax_rate() -> TaxRate {
        TaxRate::new(
            StringFixtures::country_code(),
            tax_class::REDUCED,
            Rate::new(DecimalFixtures::reduced_vat()),
            TemporalFixtures::open_effective_period(),
        )
    }

    /// A fresh invoice counter at zero for the fixture establishment
    pub fn invoice_counter() -> SequenceCounter {
        SequenceCounter::new(IdFixtures::establishment_id(), INVOICE_SEQUENCE, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_fixtures_currencies_match() {
        let eur = MoneyFixtures::eur_100();
        assert_eq!(eur.currency(), Currency::EUR);

        let usd = MoneyFixtures::usd_100();
        assert_eq!(usd.currency(), Currency::USD);
    }

    #[test]
    fn test_temporal_fixtures_ordering() {
        assert!(TemporalFixtures::rate_effective_from() < TemporalFixtures::issue_date());
        assert!(TemporalFixtures::issue_date() < TemporalFixtures::due_date());
    }

    #[test]
    fn test_id_fixtures_are_deterministic() {
        assert_eq!(IdFixtures::buyer_id(), IdFixtures::buyer_id());
        assert_ne!(IdFixtures::buyer_id(), IdFixtures::vendor_id());
    }

    #[test]
    fn test_standard_rate_covers_issue_date() {
        let rate = DomainFixtures::standard_tax_rate();
        assert!(rate.effective.contains(TemporalFixtures::issue_date()));
        assert!(!rate.effective.contains(TemporalFixtures::before_rates()));
    }
}
