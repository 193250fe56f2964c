//! Payment processing flows over the in-memory stores: wallet and gateway
//! routing, idempotent replay, the timeout/verify reconciliation, and
//! refunds.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{Currency, Money};
use domain_payments::{
    OrderStatus, OrderStore, PaymentMethod, PaymentProcessor, PaymentStatus, ProcessPayment,
    SandboxGateway,
};
use domain_wallet::WalletLedger;
use rust_decimal_macros::dec;
use test_utils::{
    assert_ledger_consistent, IdFixtures, MemoryOrderStore, MemoryPaymentStore, MemoryWalletStore,
    OrderSummaryBuilder, RecordingNotifier, StringFixtures,
};

struct Harness {
    payments: Arc<MemoryPaymentStore>,
    orders: Arc<MemoryOrderStore>,
    ledger: WalletLedger,
    notifier: Arc<RecordingNotifier>,
    processor: PaymentProcessor,
}

fn harness_with_gateway(gateway: SandboxGateway, timeout: Duration) -> Harness {
    let payments = Arc::new(MemoryPaymentStore::new());
    let orders = Arc::new(MemoryOrderStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let ledger = WalletLedger::new(Arc::new(MemoryWalletStore::new()));

    let processor = PaymentProcessor::new(
        payments.clone(),
        orders.clone(),
        ledger.clone(),
        Arc::new(gateway),
        notifier.clone(),
        timeout,
    );

    Harness {
        payments,
        orders,
        ledger,
        notifier,
        processor,
    }
}

fn harness() -> Harness {
    harness_with_gateway(SandboxGateway::always_approving(), Duration::from_secs(5))
}

fn wallet_payment() -> ProcessPayment {
    ProcessPayment {
        order_id: IdFixtures::order_id(),
        idempotency_key: StringFixtures::idempotency_key().to_string(),
        method: PaymentMethod::Wallet,
    }
}

fn card_payment() -> ProcessPayment {
    ProcessPayment {
        method: PaymentMethod::Card,
        ..wallet_payment()
    }
}

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

#[tokio::test]
async fn test_wallet_payment_debits_and_places_the_order() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    let payment = h.processor.process(wallet_payment()).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount.amount(), dec!(250.00));

    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Placed);

    let balance = h
        .ledger
        .balance(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap();
    assert_eq!(balance.amount(), dec!(50.00));

    // Buyer gets an order confirmation.
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_insufficient_funds_fails_payment_without_error() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(10.00)), None)
        .await
        .unwrap();

    let payment = h.processor.process(wallet_payment()).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(payment
        .gateway_response
        .as_deref()
        .unwrap()
        .contains("Insufficient"));

    // No funds moved, no order transition.
    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let balance = h
        .ledger
        .balance(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap();
    assert_eq!(balance.amount(), dec!(10.00));
}

#[tokio::test]
async fn test_replayed_idempotency_key_moves_money_once() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    let first = h.processor.process(wallet_payment()).await.unwrap();
    let replay = h.processor.process(wallet_payment()).await.unwrap();

    assert_eq!(first.id, replay.id);
    assert_eq!(replay.status, PaymentStatus::Completed);

    // One top-up plus exactly one debit.
    let wallet = h
        .ledger
        .wallet(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap()
        .unwrap();
    let mut entries = h.ledger.entries(wallet.id).await.unwrap();
    entries.reverse(); // oldest first
    assert_eq!(entries.len(), 2);
    assert_eq!(wallet.balance.amount(), dec!(50.00));
    assert_ledger_consistent(&wallet, &entries);
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let h = harness();
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(100.00)), None)
        .await
        .unwrap();

    let a = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move {
            ledger
                .debit(
                    IdFixtures::buyer_id(),
                    eur(dec!(60.00)),
                    core_kernel::PaymentId::new(),
                )
                .await
                .unwrap()
        })
    };
    let b = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move {
            ledger
                .debit(
                    IdFixtures::buyer_id(),
                    eur(dec!(60.00)),
                    core_kernel::PaymentId::new(),
                )
                .await
                .unwrap()
        })
    };

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let debited = outcomes.iter().filter(|o| o.is_debited()).count();

    // Two 60.00 debits against 100.00: exactly one lands.
    assert_eq!(debited, 1);
    let balance = h
        .ledger
        .balance(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap();
    assert_eq!(balance.amount(), dec!(40.00));
}

#[tokio::test]
async fn test_gateway_payment_completes_when_approved() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.gateway_reference.unwrap().starts_with("SBX-"));

    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Placed);
}

#[tokio::test]
async fn test_gateway_decline_fails_the_payment() {
    let h = harness_with_gateway(SandboxGateway::always_declining(), Duration::from_secs(5));
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Failed);
    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_timed_out_dispatch_stays_processing_until_verified() {
    // The gateway answers slower than the processor is willing to wait,
    // so the dispatch is abandoned mid-flight.
    let h = harness_with_gateway(
        SandboxGateway::new(0.0, Duration::from_millis(500), 0),
        Duration::from_millis(20),
    );
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Processing);

    // The abandoned dispatch never reached a decision, so the gateway's
    // authoritative answer is that no charge exists.
    let reconciled = h.processor.verify(payment.id).await.unwrap();
    assert_eq!(reconciled.status, PaymentStatus::Failed);

    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_stranded_wallet_payment_fails_when_the_debit_never_landed() {
    use domain_payments::{Payment, PaymentStore};

    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    // A crash between the idempotency claim and the debit leaves a Pending
    // wallet payment with no ledger entry.
    let stranded = Payment::claim(
        IdFixtures::order_id(),
        StringFixtures::idempotency_key(),
        PaymentMethod::Wallet,
        eur(dec!(250.00)),
    );
    h.payments.insert_new(stranded.clone()).await.unwrap();

    let reconciled = h.processor.verify(stranded.id).await.unwrap();

    // The ledger is the authority here, not the gateway, which has never
    // seen this payment.
    assert_eq!(reconciled.status, PaymentStatus::Failed);
    assert!(reconciled.gateway_response.is_none());

    let balance = h
        .ledger
        .balance(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap();
    assert_eq!(balance.amount(), dec!(300.00));
    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_stranded_wallet_payment_completes_when_the_debit_landed() {
    use domain_payments::{Payment, PaymentStore};

    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    // Crash after the debit but before the payment row was updated: the
    // buyer's money moved, so reconciliation must keep the charge.
    let stranded = Payment::claim(
        IdFixtures::order_id(),
        StringFixtures::idempotency_key(),
        PaymentMethod::Wallet,
        eur(dec!(250.00)),
    );
    h.payments.insert_new(stranded.clone()).await.unwrap();
    h.ledger
        .debit(IdFixtures::buyer_id(), eur(dec!(250.00)), stranded.id)
        .await
        .unwrap();

    let reconciled = h.processor.verify(stranded.id).await.unwrap();

    assert_eq!(reconciled.status, PaymentStatus::Completed);
    let order = h.orders.get(IdFixtures::order_id()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Placed);
}

#[tokio::test]
async fn test_verify_is_a_no_op_on_terminal_payments() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let verified = h.processor.verify(payment.id).await.unwrap();
    assert_eq!(verified.status, PaymentStatus::Completed);
    assert_eq!(verified.gateway_reference, payment.gateway_reference);
}

#[tokio::test]
async fn test_wallet_refund_restores_the_balance() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    let payment = h.processor.process(wallet_payment()).await.unwrap();
    let refunded = h.processor.refund(payment.id).await.unwrap();

    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let wallet = h
        .ledger
        .wallet(IdFixtures::buyer_id(), Currency::EUR)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wallet.balance.amount(), dec!(300.00));

    // Top-up, debit, refund: the full history still balances.
    let mut entries = h.ledger.entries(wallet.id).await.unwrap();
    entries.reverse();
    assert_eq!(entries.len(), 3);
    assert_ledger_consistent(&wallet, &entries);
}

#[tokio::test]
async fn test_failed_payment_cannot_be_refunded() {
    let h = harness_with_gateway(SandboxGateway::always_declining(), Duration::from_secs(5));
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);

    assert!(h.processor.refund(payment.id).await.is_err());
}

#[tokio::test]
async fn test_cancel_abandons_a_processing_payment() {
    let h = harness_with_gateway(
        SandboxGateway::new(0.0, Duration::from_millis(500), 0),
        Duration::from_millis(20),
    );
    h.orders.insert(OrderSummaryBuilder::new().build());

    let payment = h.processor.process(card_payment()).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Processing);

    let cancelled = h.processor.cancel(payment.id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    // Terminal now; cancelling again is refused.
    assert!(h.processor.cancel(payment.id).await.is_err());
}

#[tokio::test]
async fn test_payment_against_a_placed_order_is_refused() {
    let h = harness();
    h.orders.insert(
        OrderSummaryBuilder::new()
            .with_status(OrderStatus::Placed)
            .build(),
    );

    assert!(h.processor.process(card_payment()).await.is_err());
}

#[tokio::test]
async fn test_attempts_for_order_are_listed() {
    let h = harness();
    h.orders.insert(OrderSummaryBuilder::new().build());
    h.ledger
        .top_up(IdFixtures::buyer_id(), eur(dec!(300.00)), None)
        .await
        .unwrap();

    h.processor.process(wallet_payment()).await.unwrap();

    let attempts = h
        .processor
        .payments_for_order(IdFixtures::order_id())
        .await
        .unwrap();
    assert_eq!(attempts.len(), 1);
}
