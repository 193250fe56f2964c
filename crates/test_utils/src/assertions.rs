//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::{EffectivePeriod, Money};
use domain_invoicing::BillingDocument;
use domain_wallet::{Wallet, WalletTransaction};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than
/// `tolerance`
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that money values sum to a total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(total.currency()), |acc, m| {
        acc.checked_add(m).expect("Currency mismatch in sum")
    });

    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts that a document's totals are internally consistent
///
/// Checks that line totals sum to the subtotal, line taxes sum to the tax
/// amount, and subtotal + tax equals the total, all at the currency's
/// minor-unit precision.
pub fn assert_document_totals_consistent(document: &BillingDocument) {
    let line_totals: Vec<Money> = document.lines.iter().map(|l| l.line_total).collect();
    assert_money_sum_equals(&line_totals, &document.subtotal);

    let line_taxes: Vec<Money> = document.lines.iter().map(|l| l.tax_amount).collect();
    assert_money_sum_equals(&line_taxes, &document.tax_amount);

    let computed_total = document
        .subtotal
        .checked_add(&document.tax_amount)
        .expect("Currency mismatch inside document")
        .round_to_currency();
    assert_eq!(
        computed_total.amount(),
        document.total_amount.amount(),
        "Document {} total {} != subtotal {} + tax {}",
        document.document_number,
        document.total_amount.amount(),
        document.subtotal.amount(),
        document.tax_amount.amount()
    );

    assert!(
        document.totals_consistent(),
        "Document {} reports inconsistent totals",
        document.document_number
    );
}

/// Asserts the wallet ledger invariant over a full entry history
///
/// The entries must belong to the wallet and be ordered oldest first. Checks
/// that the signed sum of entries equals the balance and that every entry's
/// `balance_after` matches the running balance at that point.
pub fn assert_ledger_consistent(wallet: &Wallet, entries: &[WalletTransaction]) {
    let mut running = Money::zero(wallet.balance.currency());

    for entry in entries {
        assert_eq!(
            entry.wallet_id, wallet.id,
            "Entry {} belongs to a different wallet",
            entry.id
        );

        running = if entry.transaction_type.sign() > 0 {
            running
                .checked_add(&entry.amount)
                .expect("Currency mismatch in ledger")
        } else {
            running
                .checked_sub(&entry.amount)
                .expect("Currency mismatch in ledger")
        };

        assert_eq!(
            entry.balance_after.amount(),
            running.amount(),
            "Entry {} records balance_after {} but the running balance is {}",
            entry.id,
            entry.balance_after.amount(),
            running.amount()
        );
    }

    assert_eq!(
        wallet.balance.amount(),
        running.amount(),
        "Wallet balance {} doesn't equal the signed sum of its {} entries ({})",
        wallet.balance.amount(),
        entries.len(),
        running.amount()
    );
}

/// Asserts that an effective period contains a date
pub fn assert_period_contains(period: &EffectivePeriod, date: chrono::NaiveDate) {
    assert!(
        period.contains(date),
        "Period {:?} does not contain {}",
        period,
        date
    );
}

/// Asserts that two effective periods do not overlap
pub fn assert_periods_disjoint(a: &EffectivePeriod, b: &EffectivePeriod) {
    assert!(
        !a.overlaps(b),
        "Periods {:?} and {:?} unexpectedly overlap",
        a,
        b
    );
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err matching {}, got Ok({:?})",
                stringify!($pattern),
                value
            ),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{AccountId, Currency, WalletId};
    use domain_wallet::TransactionType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_approx_eq_passes() {
        let m1 = Money::new(dec!(100.001), Currency::EUR);
        let m2 = Money::new(dec!(100.002), Currency::EUR);
        assert_money_approx_eq(&m1, &m2, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_assert_money_approx_eq_currency_mismatch() {
        let m1 = Money::new(dec!(100.00), Currency::USD);
        let m2 = Money::new(dec!(100.00), Currency::EUR);
        assert_money_approx_eq(&m1, &m2, dec!(0.01));
    }

    #[test]
    fn test_assert_money_sum_equals() {
        let parts = vec![
            Money::new(dec!(33.34), Currency::EUR),
            Money::new(dec!(33.33), Currency::EUR),
            Money::new(dec!(33.33), Currency::EUR),
        ];
        let total = Money::new(dec!(100.00), Currency::EUR);
        assert_money_sum_equals(&parts, &total);
    }

    #[test]
    fn test_ledger_consistency_on_simple_history() {
        let mut wallet = Wallet::open(AccountId::new(), Currency::EUR);
        let entries = vec![
            entry(wallet.id, TransactionType::TopUp, dec!(100.00), dec!(100.00)),
            entry(wallet.id, TransactionType::Debit, dec!(40.00), dec!(60.00)),
            entry(wallet.id, TransactionType::Refund, dec!(40.00), dec!(100.00)),
        ];
        wallet.balance = Money::new(dec!(100.00), Currency::EUR);

        assert_ledger_consistent(&wallet, &entries);
    }

    #[test]
    #[should_panic(expected = "running balance")]
    fn test_ledger_consistency_catches_bad_balance_after() {
        let mut wallet = Wallet::open(AccountId::new(), Currency::EUR);
        let entries = vec![entry(
            wallet.id,
            TransactionType::TopUp,
            dec!(100.00),
            dec!(99.00),
        )];
        wallet.balance = Money::new(dec!(100.00), Currency::EUR);

        assert_ledger_consistent(&wallet, &entries);
    }

    fn entry(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Decimal,
        after: Decimal,
    ) -> WalletTransaction {
        WalletTransaction::record(
            wallet_id,
            transaction_type,
            Money::new(amount, Currency::EUR),
            Money::new(after, Currency::EUR),
        )
    }
}
