//! In-memory implementations of the storage and collaborator ports
//!
//! Every store keeps its state under a single `Mutex`, so the operations
//! the real stores make atomic (counter increments, conditional debits,
//! idempotency claims) are atomic here too. Locks are never held across an
//! await point.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use core_kernel::{
    AccountId, Currency, DocumentId, DomainPort, DunningEventId, EstablishmentId, Money,
    Notification, NotificationSender, OrderId, PaymentId, PdfRenderer, PortError, WalletId,
};
use domain_credit::{CreditDunningEvent, CreditLimit, CreditStore};
use domain_invoicing::{
    Allocation, BillingDocument, DocumentStatus, DocumentStore, Establishment,
    EstablishmentStore, NewDocument, SequenceCounter, SequenceStore, TaxRate, TaxRateStore,
};
use domain_payments::{ClaimOutcome, OrderStatus, OrderStore, OrderSummary, Payment, PaymentStore};
use domain_wallet::{TransactionType, Wallet, WalletStore, WalletTransaction};

/// In-memory [`SequenceStore`]
///
/// The mutex serializes allocations exactly like the row lock does in
/// PostgreSQL, so concurrent `allocate` calls yield a contiguous run.
#[derive(Default)]
pub struct MemorySequenceStore {
    counters: Mutex<HashMap<(EstablishmentId, String), SequenceCounter>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemorySequenceStore {}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn allocate(
        &self,
        establishment_id: EstablishmentId,
        sequence_name: &str,
    ) -> Result<Allocation, PortError> {
        let mut counters = self.counters.lock().expect("sequence store poisoned");

        let counter = counters
            .get_mut(&(establishment_id, sequence_name.to_string()))
            .filter(|c| c.is_active)
            .ok_or_else(|| {
                PortError::not_found(
                    "SequenceCounter",
                    format!("{}/{}", establishment_id, sequence_name),
                )
            })?;

        counter.current_value += 1;
        Ok(Allocation {
            counter: counter.clone(),
            value: counter.current_value,
        })
    }

    async fn provision(&self, counter: SequenceCounter) -> Result<(), PortError> {
        let mut counters = self.counters.lock().expect("sequence store poisoned");
        let key = (counter.establishment_id, counter.sequence_name.clone());

        if counters.contains_key(&key) {
            return Err(PortError::conflict(format!(
                "Counter {}/{} already provisioned",
                key.0, key.1
            )));
        }
        counters.insert(key, counter);
        Ok(())
    }
}

/// In-memory [`TaxRateStore`] enforcing the non-overlap rule on publish
#[derive(Default)]
pub struct MemoryTaxRateStore {
    rates: Mutex<Vec<TaxRate>>,
}

impl MemoryTaxRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemoryTaxRateStore {}

#[async_trait]
impl TaxRateStore for MemoryTaxRateStore {
    async fn applicable(
        &self,
        country_code: &str,
        tax_class: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRate>, PortError> {
        let rates = self.rates.lock().expect("tax rate store poisoned");
        Ok(rates
            .iter()
            .filter(|r| {
                r.country_code == country_code
                    && r.tax_class == tax_class
                    && r.effective.contains(as_of)
            })
            .cloned()
            .collect())
    }

    async fn publish(&self, rate: TaxRate) -> Result<(), PortError> {
        let mut rates = self.rates.lock().expect("tax rate store poisoned");

        let overlapping = rates.iter().any(|existing| {
            existing.country_code == rate.country_code
                && existing.tax_class == rate.tax_class
                && existing.effective.overlaps(&rate.effective)
        });
        if overlapping {
            return Err(PortError::conflict(format!(
                "Overlapping effective range for {}/{}",
                rate.country_code, rate.tax_class
            )));
        }

        rates.push(rate);
        Ok(())
    }
}

/// In-memory [`EstablishmentStore`]
#[derive(Default)]
pub struct MemoryEstablishmentStore {
    establishments: Mutex<HashMap<EstablishmentId, Establishment>>,
}

impl MemoryEstablishmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemoryEstablishmentStore {}

#[async_trait]
impl EstablishmentStore for MemoryEstablishmentStore {
    async fn get(&self, id: EstablishmentId) -> Result<Option<Establishment>, PortError> {
        let establishments = self.establishments.lock().expect("establishment store poisoned");
        Ok(establishments.get(&id).cloned())
    }

    async fn register(&self, establishment: Establishment) -> Result<(), PortError> {
        let mut establishments =
            self.establishments.lock().expect("establishment store poisoned");
        establishments.insert(establishment.id, establishment);
        Ok(())
    }
}

/// In-memory [`DocumentStore`] allocating numbers through a shared
/// [`MemorySequenceStore`]
///
/// Tests provision the counters on the sequence store they pass in.
pub struct MemoryDocumentStore {
    sequences: std::sync::Arc<MemorySequenceStore>,
    documents: Mutex<HashMap<DocumentId, BillingDocument>>,
}

impl MemoryDocumentStore {
    pub fn new(sequences: std::sync::Arc<MemorySequenceStore>) -> Self {
        Self {
            sequences,
            documents: Mutex::new(HashMap::new()),
        }
    }
}

impl DomainPort for MemoryDocumentStore {}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, new: NewDocument) -> Result<BillingDocument, PortError> {
        let allocation = self
            .sequences
            .allocate(new.establishment_id, new.kind.sequence_name())
            .await?;
        let number = allocation.formatted();

        let document = new.into_document(DocumentId::new_v7(), number, Utc::now());

        let mut documents = self.documents.lock().expect("document store poisoned");
        documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<BillingDocument>, PortError> {
        let documents = self.documents.lock().expect("document store poisoned");
        Ok(documents.get(&id).cloned())
    }

    async fn transition_status(
        &self,
        id: DocumentId,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<BillingDocument, PortError> {
        let mut documents = self.documents.lock().expect("document store poisoned");
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("BillingDocument", id))?;

        // Same guard as the conditional UPDATE in PostgreSQL.
        if document.status != from {
            return Err(PortError::conflict(format!(
                "Document {} is {:?}, not {:?}",
                id, document.status, from
            )));
        }

        document.status = to;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn set_pdf_location(&self, id: DocumentId, storage_key: &str) -> Result<(), PortError> {
        let mut documents = self.documents.lock().expect("document store poisoned");
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("BillingDocument", id))?;

        document.pdf_location = Some(storage_key.to_string());
        document.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
struct WalletState {
    wallets: HashMap<WalletId, Wallet>,
    by_account: HashMap<(AccountId, &'static str), WalletId>,
    entries: Vec<WalletTransaction>,
}

/// In-memory [`WalletStore`]
///
/// The single lock makes `try_debit` as race-safe as the conditional
/// UPDATE in PostgreSQL: of two concurrent debits that together exceed the
/// balance, exactly one succeeds.
#[derive(Default)]
pub struct MemoryWalletStore {
    state: Mutex<WalletState>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemoryWalletStore {}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn get_or_create(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Wallet, PortError> {
        let mut state = self.state.lock().expect("wallet store poisoned");

        if let Some(id) = state.by_account.get(&(account_id, currency.code())) {
            return Ok(state.wallets[id].clone());
        }

        let wallet = Wallet::open(account_id, currency);
        state.by_account.insert((account_id, currency.code()), wallet.id);
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn get_by_account(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Option<Wallet>, PortError> {
        let state = self.state.lock().expect("wallet store poisoned");
        Ok(state
            .by_account
            .get(&(account_id, currency.code()))
            .map(|id| state.wallets[id].clone()))
    }

    async fn credit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        transaction_type: TransactionType,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<(Wallet, WalletTransaction), PortError> {
        if transaction_type == TransactionType::Debit {
            return Err(PortError::validation("credit() cannot apply a DEBIT entry"));
        }

        let mut state = self.state.lock().expect("wallet store poisoned");
        let wallet = state
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| PortError::not_found("Wallet", wallet_id))?;

        wallet.balance = wallet
            .balance
            .checked_add(&amount)
            .map_err(|e| PortError::validation(e.to_string()))?;
        wallet.updated_at = Utc::now();
        let wallet = wallet.clone();

        let mut entry =
            WalletTransaction::record(wallet_id, transaction_type, amount, wallet.balance);
        entry.payment_id = payment_id;
        entry.description = description;
        state.entries.push(entry.clone());

        Ok((wallet, entry))
    }

    async fn try_debit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<Option<(Wallet, WalletTransaction)>, PortError> {
        let mut state = self.state.lock().expect("wallet store poisoned");
        let wallet = state
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| PortError::not_found("Wallet", wallet_id))?;

        if !wallet.covers(&amount) {
            return Ok(None);
        }

        wallet.balance = wallet
            .balance
            .checked_sub(&amount)
            .map_err(|e| PortError::validation(e.to_string()))?;
        wallet.updated_at = Utc::now();
        let wallet = wallet.clone();

        let mut entry =
            WalletTransaction::record(wallet_id, TransactionType::Debit, amount, wallet.balance);
        entry.payment_id = payment_id;
        entry.description = description;
        state.entries.push(entry.clone());

        Ok(Some((wallet, entry)))
    }

    async fn transactions(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, PortError> {
        let state = self.state.lock().expect("wallet store poisoned");
        let mut entries: Vec<WalletTransaction> = state
            .entries
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

/// In-memory [`PaymentStore`]
///
/// The idempotency claim is decided under the lock, mirroring the unique
/// index race in PostgreSQL.
#[derive(Default)]
pub struct MemoryPaymentStore {
    payments: Mutex<Vec<Payment>>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemoryPaymentStore {}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert_new(&self, payment: Payment) -> Result<ClaimOutcome, PortError> {
        let mut payments = self.payments.lock().expect("payment store poisoned");

        if let Some(existing) = payments
            .iter()
            .find(|p| p.idempotency_key == payment.idempotency_key)
        {
            return Ok(ClaimOutcome::Existing(existing.clone()));
        }

        payments.push(payment.clone());
        Ok(ClaimOutcome::Created(payment))
    }

    async fn update(&self, payment: &Payment) -> Result<(), PortError> {
        let mut payments = self.payments.lock().expect("payment store poisoned");
        let stored = payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| PortError::not_found("Payment", payment.id))?;
        *stored = payment.clone();
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, PortError> {
        let payments = self.payments.lock().expect("payment store poisoned");
        Ok(payments.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>, PortError> {
        let payments = self.payments.lock().expect("payment store poisoned");
        Ok(payments.iter().find(|p| p.idempotency_key == key).cloned())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError> {
        let payments = self.payments.lock().expect("payment store poisoned");
        let mut matches: Vec<Payment> = payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        matches.reverse();
        Ok(matches)
    }
}

/// In-memory [`OrderStore`] with a seeding helper for tests
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<OrderId, OrderSummary>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an order the processor can pay
    pub fn insert(&self, order: OrderSummary) {
        let mut orders = self.orders.lock().expect("order store poisoned");
        orders.insert(order.id, order);
    }
}

impl DomainPort for MemoryOrderStore {}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, id: OrderId) -> Result<Option<OrderSummary>, PortError> {
        let orders = self.orders.lock().expect("order store poisoned");
        Ok(orders.get(&id).cloned())
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), PortError> {
        let mut orders = self.orders.lock().expect("order store poisoned");
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Order", id))?;
        order.status = status;
        Ok(())
    }
}

#[derive(Default)]
struct CreditState {
    limits: HashMap<AccountId, CreditLimit>,
    events: Vec<CreditDunningEvent>,
}

/// In-memory [`CreditStore`]
#[derive(Default)]
pub struct MemoryCreditStore {
    state: Mutex<CreditState>,
}

impl MemoryCreditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for MemoryCreditStore {}

#[async_trait]
impl CreditStore for MemoryCreditStore {
    async fn get(&self, account_id: AccountId) -> Result<Option<CreditLimit>, PortError> {
        let state = self.state.lock().expect("credit store poisoned");
        Ok(state.limits.get(&account_id).cloned())
    }

    async fn open(&self, limit: CreditLimit) -> Result<(), PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        if state.limits.contains_key(&limit.account_id) {
            return Err(PortError::conflict(format!(
                "Credit line for account {} already exists",
                limit.account_id
            )));
        }
        state.limits.insert(limit.account_id, limit);
        Ok(())
    }

    async fn increase(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        let limit = state
            .limits
            .get_mut(&account_id)
            .filter(|l| l.is_active)
            .ok_or_else(|| PortError::not_found("CreditLimit", account_id))?;

        limit.current_balance = limit
            .current_balance
            .checked_add(&amount)
            .map_err(|e| PortError::validation(e.to_string()))?;
        limit.updated_at = Utc::now();
        Ok(limit.clone())
    }

    async fn try_increase_within_limit(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<Option<CreditLimit>, PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        let Some(limit) = state.limits.get_mut(&account_id).filter(|l| l.is_active) else {
            return Ok(None);
        };

        let raised = limit
            .current_balance
            .checked_add(&amount)
            .map_err(|e| PortError::validation(e.to_string()))?;
        if raised.amount() > limit.approved_limit.amount() {
            return Ok(None);
        }

        limit.current_balance = raised;
        limit.updated_at = Utc::now();
        Ok(Some(limit.clone()))
    }

    async fn decrease(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        let limit = state
            .limits
            .get_mut(&account_id)
            .ok_or_else(|| PortError::not_found("CreditLimit", account_id))?;

        // Clamp at zero, like GREATEST(current_balance - $2, 0)
        limit.current_balance = if amount.amount() >= limit.current_balance.amount() {
            Money::zero(limit.currency())
        } else {
            limit
                .current_balance
                .checked_sub(&amount)
                .map_err(|e| PortError::validation(e.to_string()))?
        };
        limit.updated_at = Utc::now();
        Ok(limit.clone())
    }

    async fn record_event(&self, event: CreditDunningEvent) -> Result<(), PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        state.events.push(event);
        Ok(())
    }

    async fn active_events(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<CreditDunningEvent>, PortError> {
        let state = self.state.lock().expect("credit store poisoned");
        Ok(state
            .events
            .iter()
            .filter(|e| e.account_id == account_id && !e.resolved)
            .cloned()
            .collect())
    }

    async fn get_event(
        &self,
        event_id: DunningEventId,
    ) -> Result<Option<CreditDunningEvent>, PortError> {
        let state = self.state.lock().expect("credit store poisoned");
        Ok(state.events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn update_event(&self, event: &CreditDunningEvent) -> Result<(), PortError> {
        let mut state = self.state.lock().expect("credit store poisoned");
        let stored = state
            .events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| PortError::not_found("CreditDunningEvent", event.id))?;
        *stored = event.clone();
        Ok(())
    }
}

/// Notification sender that records everything it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notification sent so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier poisoned").clone()
    }
}

impl DomainPort for RecordingNotifier {}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), PortError> {
        self.sent.lock().expect("notifier poisoned").push(notification);
        Ok(())
    }
}

/// PDF renderer that always succeeds with a deterministic key
#[derive(Debug, Default)]
pub struct StaticPdfRenderer;

impl DomainPort for StaticPdfRenderer {}

#[async_trait]
impl PdfRenderer for StaticPdfRenderer {
    async fn generate_and_upload(
        &self,
        _document_id: &str,
        document_number: &str,
    ) -> Result<String, PortError> {
        Ok(format!("test-pdfs/{}.pdf", document_number))
    }

    async fn signed_url(&self, storage_key: &str, ttl: Duration) -> Result<String, PortError> {
        Ok(format!(
            "https://files.test/{}?expires_in={}",
            storage_key,
            ttl.as_secs()
        ))
    }
}

/// PDF renderer that always fails, for exercising the degraded path
#[derive(Debug, Default)]
pub struct FailingPdfRenderer;

impl DomainPort for FailingPdfRenderer {}

#[async_trait]
impl PdfRenderer for FailingPdfRenderer {
    async fn generate_and_upload(
        &self,
        _document_id: &str,
        _document_number: &str,
    ) -> Result<String, PortError> {
        Err(PortError::connection("PDF service unavailable"))
    }

    async fn signed_url(&self, _storage_key: &str, _ttl: Duration) -> Result<String, PortError> {
        Err(PortError::connection("PDF service unavailable"))
    }
}
