//! Storage ports for the invoicing domain
//!
//! Implementations live in `infra_db`; in-memory doubles in `test_utils`.
//! Ports that allocate or mutate are responsible for their own atomicity:
//! in particular [`DocumentStore::create`] must perform the counter
//! increment and the document insert in one store transaction, so a failed
//! insert never consumes a number.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    AccountId, Currency, DocumentId, DomainPort, EstablishmentId, OrderId, PortError,
};

use crate::document::{BillingDocument, DocumentKind, DocumentLine, DocumentStatus};
use crate::establishment::Establishment;
use crate::sequence::{Allocation, SequenceCounter};
use crate::tax::TaxRate;

/// Counter row storage with atomic allocation
#[async_trait]
pub trait SequenceStore: DomainPort {
    /// Atomically increments the counter and returns the allocated value
    ///
    /// Concurrent calls for the same key are serialized by the store; two
    /// callers can never observe the same value.
    ///
    /// # Errors
    ///
    /// Returns `PortError::NotFound` if no active counter exists for the key.
    async fn allocate(
        &self,
        establishment_id: EstablishmentId,
        sequence_name: &str,
    ) -> Result<Allocation, PortError>;

    /// Provisions a new counter row
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if a counter already exists for the key.
    async fn provision(&self, counter: SequenceCounter) -> Result<(), PortError>;
}

/// Published tax rate storage
#[async_trait]
pub trait TaxRateStore: DomainPort {
    /// Returns the rate rows for (country, tax class) whose effective period
    /// contains `as_of`
    async fn applicable(
        &self,
        country_code: &str,
        tax_class: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRate>, PortError>;

    /// Publishes a new rate row
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the new row's effective period
    /// overlaps an existing row for the same (country, tax class).
    async fn publish(&self, rate: TaxRate) -> Result<(), PortError>;
}

/// Establishment registry
#[async_trait]
pub trait EstablishmentStore: DomainPort {
    async fn get(&self, id: EstablishmentId) -> Result<Option<Establishment>, PortError>;

    async fn register(&self, establishment: Establishment) -> Result<(), PortError>;
}

/// A fully priced document awaiting number allocation and persistence
///
/// Everything except the identifier and document number, which the store
/// assigns inside its creation transaction.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub establishment_id: EstablishmentId,
    pub order_id: Option<OrderId>,
    pub customer_id: AccountId,
    pub vendor_id: AccountId,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub lines: Vec<DocumentLine>,
    pub reference_document_id: Option<DocumentId>,
    pub po_number: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl NewDocument {
    /// Materializes the draft document once the store has assigned its
    /// identity, computing totals from the lines
    pub fn into_document(
        self,
        id: DocumentId,
        document_number: String,
        now: DateTime<Utc>,
    ) -> BillingDocument {
        let (subtotal, tax_amount, total_amount) =
            BillingDocument::totals(&self.lines, self.currency);

        BillingDocument {
            id,
            kind: self.kind,
            document_number,
            establishment_id: self.establishment_id,
            order_id: self.order_id,
            customer_id: self.customer_id,
            vendor_id: self.vendor_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency: self.currency,
            lines: self.lines,
            subtotal,
            tax_amount,
            total_amount,
            status: DocumentStatus::Draft,
            reference_document_id: self.reference_document_id,
            po_number: self.po_number,
            reason: self.reason,
            notes: self.notes,
            pdf_location: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Billing document storage
#[async_trait]
pub trait DocumentStore: DomainPort {
    /// Allocates the next number for the document's kind and persists the
    /// draft, atomically
    ///
    /// The counter increment and the document insert happen in one store
    /// transaction. On any failure the transaction rolls back and the
    /// number is not consumed.
    async fn create(&self, new: NewDocument) -> Result<BillingDocument, PortError>;

    async fn get(&self, id: DocumentId) -> Result<Option<BillingDocument>, PortError>;

    /// Persists a status transition and returns the updated document
    ///
    /// The write only happens while the stored status still equals `from`;
    /// a document that moved on concurrently yields `PortError::Conflict`
    /// and stays untouched. Issued documents are legally immutable, so the
    /// store is the authority here, not a load-then-write in the service.
    async fn transition_status(
        &self,
        id: DocumentId,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<BillingDocument, PortError>;

    /// Records the object-storage key of the rendered PDF
    async fn set_pdf_location(&self, id: DocumentId, storage_key: &str) -> Result<(), PortError>;
}
