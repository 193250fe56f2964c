//! Invoicing Domain - Fiscal Document Core
//!
//! This crate implements the fiscal document subsystem of the marketplace
//! financial core:
//!
//! - **Sequence allocation**: gap-free, strictly increasing document numbers
//!   per (establishment, sequence name), formatted from a counter row.
//! - **Tax resolution**: effective-dated VAT rate lookup by country and tax
//!   class, with a degrade-safe zero-rate fallback.
//! - **Document lifecycle**: Invoice and CreditNote creation with per-line
//!   tax computation, `Draft → Issued` transition, and best-effort PDF and
//!   notification dispatch after commit.
//!
//! # Invariants
//!
//! - A document number is assigned exactly once, in the same store
//!   transaction that persists the draft document.
//! - `total = subtotal + tax` at the currency's minor-unit precision.
//! - Tax rates are snapshotted into lines at creation and never re-derived.
//! - Issued documents are immutable.

pub mod sequence;
pub mod tax;
pub mod establishment;
pub mod document;
pub mod ports;
pub mod service;
pub mod error;

pub use sequence::{
    SequenceCounter, SequenceAllocator, Allocation, format_document_number,
    INVOICE_SEQUENCE, CREDIT_NOTE_SEQUENCE,
};
pub use tax::{TaxRate, TaxRateResolver, select_applicable, tax_class};
pub use establishment::Establishment;
pub use document::{BillingDocument, DocumentLine, DocumentKind, DocumentStatus};
pub use ports::{
    SequenceStore, TaxRateStore, EstablishmentStore, DocumentStore, NewDocument,
};
pub use service::{InvoicingService, CreateInvoice, CreateCreditNote, LineRequest};
pub use error::InvoicingError;
