//! Wallet domain tests for the entity layer; ledger behavior against a
//! store is covered by the workspace integration tests.

use core_kernel::{AccountId, Currency, Money, PaymentId};
use domain_wallet::{TransactionType, Wallet, WalletTransaction};
use rust_decimal_macros::dec;

#[test]
fn test_new_wallet_starts_empty() {
    let wallet = Wallet::open(AccountId::new(), Currency::EUR);
    assert!(wallet.balance.is_zero());
    assert_eq!(wallet.balance.currency(), Currency::EUR);
}

#[test]
fn test_covers_checks_amount_and_currency() {
    let mut wallet = Wallet::open(AccountId::new(), Currency::EUR);
    wallet.balance = Money::new(dec!(50.00), Currency::EUR);

    assert!(wallet.covers(&Money::new(dec!(50.00), Currency::EUR)));
    assert!(wallet.covers(&Money::new(dec!(49.99), Currency::EUR)));
    assert!(!wallet.covers(&Money::new(dec!(50.01), Currency::EUR)));
    assert!(!wallet.covers(&Money::new(dec!(10.00), Currency::USD)));
}

#[test]
fn test_transaction_links_to_payment() {
    let wallet = Wallet::open(AccountId::new(), Currency::EUR);
    let payment_id = PaymentId::new();

    let entry = WalletTransaction::record(
        wallet.id,
        TransactionType::Debit,
        Money::new(dec!(25.00), Currency::EUR),
        Money::new(dec!(75.00), Currency::EUR),
    )
    .with_payment(payment_id)
    .with_description("Order payment");

    assert_eq!(entry.payment_id, Some(payment_id));
    assert_eq!(entry.transaction_type.sign(), -1);
    assert_eq!(entry.balance_after.amount(), dec!(75.00));
}

#[test]
fn test_signed_sum_reproduces_balance() {
    let wallet = Wallet::open(AccountId::new(), Currency::EUR);
    let entries = [
        (TransactionType::TopUp, dec!(100.00)),
        (TransactionType::Debit, dec!(30.00)),
        (TransactionType::Refund, dec!(5.00)),
        (TransactionType::Debit, dec!(20.00)),
    ];

    let mut balance = Money::zero(Currency::EUR);
    for (kind, amount) in entries {
        let movement = Money::new(amount, Currency::EUR);
        balance = if kind.sign() > 0 {
            balance + movement
        } else {
            balance - movement
        };
        let entry = WalletTransaction::record(wallet.id, kind, movement, balance);
        assert_eq!(entry.balance_after, balance);
    }

    assert_eq!(balance.amount(), dec!(55.00));
}
