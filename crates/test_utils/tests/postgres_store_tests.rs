//! Postgres repository tests against a real database.
//!
//! These exercise the SQL paths the in-memory doubles only model: the
//! atomic sequence UPDATE, the ON CONFLICT idempotency claim, the
//! conditional debit, and the clamped credit decrement. They need a
//! local Docker daemon for the testcontainers Postgres, so they are
//! ignored by default; run them with `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::Utc;
use core_kernel::{Currency, Money, OrderId, PaymentId};
use domain_credit::CreditStore;
use domain_invoicing::{SequenceCounter, SequenceStore, INVOICE_SEQUENCE};
use domain_payments::{
    ClaimOutcome, OrderStatus, OrderStore, Payment, PaymentMethod, PaymentStatus, PaymentStore,
};
use domain_wallet::{TransactionType, WalletStore};
use infra_db::{PgCreditStore, PgOrderStore, PgPaymentStore, PgSequenceStore, PgWalletStore};
use rust_decimal_macros::dec;
use sqlx::PgPool;
use test_utils::{
    create_isolated_test_database, CreditLimitBuilder, DomainFixtures, IdFixtures,
    OrderSummaryBuilder,
};

fn eur(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

async fn seed_establishment(pool: &PgPool) {
    let establishment = DomainFixtures::establishment();
    sqlx::query(
        "INSERT INTO establishments (id, name, country_code, tax_id, is_active)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(establishment.id.as_uuid())
    .bind(&establishment.name)
    .bind(&establishment.country_code)
    .bind(&establishment.tax_id)
    .bind(establishment.is_active)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_order(pool: &PgPool) {
    let order = OrderSummaryBuilder::new().build();
    sqlx::query(
        "INSERT INTO orders (id, buyer_account_id, po_number, total_amount, currency, status)
         VALUES ($1, $2, $3, $4, $5, 'PENDING')",
    )
    .bind(order.id.as_uuid())
    .bind(order.buyer_account_id.as_uuid())
    .bind(&order.po_number)
    .bind(order.total_amount.amount())
    .bind(order.total_amount.currency().code())
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_sequence_allocations_stay_contiguous_under_concurrency() {
    let db = create_isolated_test_database().await.unwrap();
    seed_establishment(db.pool()).await;

    let store = Arc::new(PgSequenceStore::new(db.pool().clone()));
    let establishment_id = IdFixtures::establishment_id();
    store
        .provision(SequenceCounter::new(establishment_id, INVOICE_SEQUENCE, 0))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.allocate(establishment_id, INVOICE_SEQUENCE).await
        }));
    }

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap().unwrap().value);
    }
    values.sort_unstable();

    assert_eq!(values, (1..=20).collect::<Vec<i64>>());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_status_transition_refuses_a_stale_writer() {
    use core_kernel::PortError;
    use domain_invoicing::{DocumentKind, DocumentStatus, DocumentStore, NewDocument};
    use infra_db::PgDocumentStore;
    use test_utils::TemporalFixtures;

    let db = create_isolated_test_database().await.unwrap();
    seed_establishment(db.pool()).await;

    let establishment_id = IdFixtures::establishment_id();
    let sequences = PgSequenceStore::new(db.pool().clone());
    sequences
        .provision(SequenceCounter::new(establishment_id, INVOICE_SEQUENCE, 0))
        .await
        .unwrap();

    let documents = PgDocumentStore::new(db.pool().clone());
    let draft = documents
        .create(NewDocument {
            kind: DocumentKind::Invoice,
            establishment_id,
            order_id: None,
            customer_id: IdFixtures::buyer_id(),
            vendor_id: IdFixtures::vendor_id(),
            issue_date: TemporalFixtures::issue_date(),
            due_date: None,
            currency: Currency::EUR,
            lines: Vec::new(),
            reference_document_id: None,
            po_number: None,
            reason: None,
            notes: None,
        })
        .await
        .unwrap();

    documents
        .transition_status(draft.id, DocumentStatus::Draft, DocumentStatus::Issued)
        .await
        .unwrap();

    // A canceller that read the Draft before the issue landed: the
    // conditional UPDATE matches no row and the document stays issued.
    let stale = documents
        .transition_status(draft.id, DocumentStatus::Draft, DocumentStatus::Cancelled)
        .await;
    assert!(matches!(stale, Err(PortError::Conflict { .. })));

    let stored = documents.get(draft.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Issued);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_idempotency_key_claim_returns_the_existing_row() {
    let db = create_isolated_test_database().await.unwrap();
    seed_order(db.pool()).await;

    let payments = PgPaymentStore::new(db.pool().clone());
    let order_id = IdFixtures::order_id();

    let first = Payment::claim(order_id, "idem-pg-1", PaymentMethod::Card, eur(dec!(250.00)));
    let second = Payment::claim(order_id, "idem-pg-1", PaymentMethod::Card, eur(dec!(250.00)));

    let won = match payments.insert_new(first).await.unwrap() {
        ClaimOutcome::Created(payment) => payment,
        ClaimOutcome::Existing(_) => panic!("First claim must insert"),
    };

    match payments.insert_new(second).await.unwrap() {
        ClaimOutcome::Existing(payment) => assert_eq!(payment.id, won.id),
        ClaimOutcome::Created(_) => panic!("Replay must return the existing row"),
    }

    // Status updates round-trip and the order listing sees one attempt.
    let mut updated = won;
    updated.status = PaymentStatus::Completed;
    updated.gateway_reference = Some("SBX-PG-1".to_string());
    updated.updated_at = Utc::now();
    payments.update(&updated).await.unwrap();

    let stored = payments.get(updated.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Completed);
    assert_eq!(stored.gateway_reference.as_deref(), Some("SBX-PG-1"));
    assert_eq!(payments.find_by_order(order_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_order_advance_and_missing_order() {
    let db = create_isolated_test_database().await.unwrap();
    seed_order(db.pool()).await;

    let orders = PgOrderStore::new(db.pool().clone());
    let order_id = IdFixtures::order_id();

    orders.set_status(order_id, OrderStatus::Placed).await.unwrap();
    let order = orders.get(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Placed);
    assert_eq!(order.total_amount.amount(), dec!(250.00));

    assert!(orders
        .set_status(OrderId::new(), OrderStatus::Placed)
        .await
        .is_err());
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_conditional_debit_refuses_overdraft() {
    let db = create_isolated_test_database().await.unwrap();

    let wallets = PgWalletStore::new(db.pool().clone());
    let account = IdFixtures::buyer_id();

    let wallet = wallets.get_or_create(account, Currency::EUR).await.unwrap();
    wallets
        .credit(wallet.id, eur(dec!(100.00)), TransactionType::TopUp, None, None)
        .await
        .unwrap();

    // More than the balance: the conditional UPDATE matches no row.
    let refused = wallets
        .try_debit(wallet.id, eur(dec!(150.00)), Some(PaymentId::new()), None)
        .await
        .unwrap();
    assert!(refused.is_none());

    let (debited, entry) = wallets
        .try_debit(wallet.id, eur(dec!(60.00)), Some(PaymentId::new()), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(debited.balance.amount(), dec!(40.00));
    assert_eq!(entry.balance_after.amount(), dec!(40.00));

    // Newest first: the debit row precedes the top-up.
    let entries = wallets.transactions(wallet.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].transaction_type, TransactionType::Debit);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn test_pg_credit_decrease_clamps_at_zero() {
    let db = create_isolated_test_database().await.unwrap();

    let credit = PgCreditStore::new(db.pool().clone());
    let account = IdFixtures::buyer_id();
    credit.open(CreditLimitBuilder::new().build()).await.unwrap();

    credit.increase(account, eur(dec!(400.00))).await.unwrap();
    let limit = credit.decrease(account, eur(dec!(1000.00))).await.unwrap();

    assert!(limit.current_balance.is_zero());
    assert_eq!(limit.available().amount(), dec!(5000.00));
}
