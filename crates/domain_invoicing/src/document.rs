//! Billing documents: invoices and credit notes
//!
//! Both document kinds share one shape, discriminated by [`DocumentKind`].
//! A document is created in `Draft` with its number already assigned, and
//! the only forward transition is `Draft → Issued`. Issued documents are
//! immutable. `Cancelled` is reachable from `Draft` only; the allocated
//! number stays consumed so the sequence remains gap-free.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    AccountId, Currency, DocumentId, DocumentLineId, EstablishmentId, Money, OrderId,
    ProductId, Rate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvoicingError;

/// Discriminates invoices from credit notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,
    CreditNote,
}

impl DocumentKind {
    /// The sequence name this kind allocates numbers from
    pub fn sequence_name(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => crate::sequence::INVOICE_SEQUENCE,
            DocumentKind::CreditNote => crate::sequence::CREDIT_NOTE_SEQUENCE,
        }
    }
}

/// Document lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Mutable, not yet legally effective
    Draft,
    /// Legally effective, immutable
    Issued,
    /// Voided before issue; the document number stays consumed
    Cancelled,
}

/// A priced line on a billing document
///
/// The tax rate is snapshotted at creation and never re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLine {
    /// Line identifier
    pub id: DocumentLineId,
    /// Product being billed
    pub product_id: ProductId,
    /// Product display name
    pub product_name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Quantity, strictly positive
    pub quantity: u32,
    /// Price per unit
    pub unit_price: Money,
    /// `unit_price × quantity`
    pub line_total: Money,
    /// Tax class the rate was resolved for
    pub tax_class: String,
    /// Rate snapshotted at creation
    pub tax_rate: Rate,
    /// `line_total × tax_rate`, rounded half-up to the currency's minor units
    pub tax_amount: Money,
}

impl DocumentLine {
    /// Computes a line from its inputs
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::Validation` if quantity is zero or the unit
    /// price is negative.
    pub fn compute(
        product_id: ProductId,
        product_name: impl Into<String>,
        description: Option<String>,
        quantity: u32,
        unit_price: Money,
        tax_class: impl Into<String>,
        tax_rate: Rate,
    ) -> Result<Self, InvoicingError> {
        if quantity == 0 {
            return Err(InvoicingError::validation("Line quantity must be positive"));
        }
        if unit_price.is_negative() {
            return Err(InvoicingError::validation("Unit price must not be negative"));
        }

        let line_total = unit_price.multiply(Decimal::from(quantity));
        let tax_amount = tax_rate.apply(&line_total).round_to_currency();

        Ok(Self {
            id: DocumentLineId::new_v7(),
            product_id,
            product_name: product_name.into(),
            description,
            quantity,
            unit_price,
            line_total,
            tax_class: tax_class.into(),
            tax_rate,
            tax_amount,
        })
    }
}

/// An invoice or credit note with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingDocument {
    /// Unique identifier
    pub id: DocumentId,
    /// Invoice or credit note
    pub kind: DocumentKind,
    /// Gap-free sequential number, assigned exactly once at creation
    pub document_number: String,
    /// Issuing establishment
    pub establishment_id: EstablishmentId,
    /// Order the invoice bills, if any
    pub order_id: Option<OrderId>,
    /// Customer being billed (or credited)
    pub customer_id: AccountId,
    /// Vendor issuing the document
    pub vendor_id: AccountId,
    /// Issue date; tax rates were resolved as of this date for invoices
    pub issue_date: NaiveDate,
    /// Payment due date
    pub due_date: Option<NaiveDate>,
    /// Document currency
    pub currency: Currency,
    /// Ordered lines
    pub lines: Vec<DocumentLine>,
    /// Sum of line totals
    pub subtotal: Money,
    /// Sum of line tax amounts
    pub tax_amount: Money,
    /// `subtotal + tax_amount`
    pub total_amount: Money,
    /// Lifecycle status
    pub status: DocumentStatus,
    /// For credit notes: the invoice being credited
    pub reference_document_id: Option<DocumentId>,
    /// Buyer's purchase order number
    pub po_number: Option<String>,
    /// For credit notes: the crediting reason
    pub reason: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Object-storage key of the rendered PDF, once available
    pub pdf_location: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl BillingDocument {
    /// Sums line amounts into (subtotal, tax, total)
    pub fn totals(lines: &[DocumentLine], currency: Currency) -> (Money, Money, Money) {
        let subtotal = lines
            .iter()
            .fold(Money::zero(currency), |acc, l| acc + l.line_total);
        let tax = lines
            .iter()
            .fold(Money::zero(currency), |acc, l| acc + l.tax_amount);
        (subtotal, tax, subtotal + tax)
    }

    /// Transitions `Draft → Issued`
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::InvalidState` if the document is not Draft.
    pub fn issue(&mut self) -> Result<(), InvoicingError> {
        if self.status != DocumentStatus::Draft {
            return Err(InvoicingError::invalid_state(format!(
                "Only draft documents can be issued, current status: {:?}",
                self.status
            )));
        }
        self.status = DocumentStatus::Issued;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancels a draft document; the allocated number is never reused
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::InvalidState` if the document is not Draft.
    pub fn cancel(&mut self) -> Result<(), InvoicingError> {
        if self.status != DocumentStatus::Draft {
            return Err(InvoicingError::invalid_state(format!(
                "Only draft documents can be cancelled, current status: {:?}",
                self.status
            )));
        }
        self.status = DocumentStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Verifies the totals invariant: `total = subtotal + tax`
    pub fn totals_consistent(&self) -> bool {
        let (subtotal, tax, total) = Self::totals(&self.lines, self.currency);
        self.subtotal == subtotal && self.tax_amount == tax && self.total_amount == total
    }
}
