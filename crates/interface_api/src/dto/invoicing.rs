//! Invoicing DTOs

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{AccountId, EstablishmentId, Money, OrderId, ProductId};
use domain_invoicing::{
    BillingDocument, CreateCreditNote, CreateInvoice, DocumentKind, DocumentLine, DocumentStatus,
    LineRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

use super::parse_currency;

#[derive(Debug, Serialize, Deserialize)]
pub struct LineRequestDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax_class: String,
}

impl LineRequestDto {
    fn into_line_request(self) -> LineRequest {
        LineRequest {
            product_id: ProductId::from_uuid(self.product_id),
            product_name: self.product_name,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            tax_class: self.tax_class,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub establishment_id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub po_number: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one line is required"))]
    pub lines: Vec<LineRequestDto>,
}

impl CreateInvoiceRequest {
    pub fn into_command(self) -> Result<CreateInvoice, ApiError> {
        let currency = parse_currency(&self.currency)?;
        Ok(CreateInvoice {
            establishment_id: EstablishmentId::from_uuid(self.establishment_id),
            order_id: self.order_id.map(OrderId::from_uuid),
            customer_id: AccountId::from_uuid(self.customer_id),
            vendor_id: AccountId::from_uuid(self.vendor_id),
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency,
            po_number: self.po_number,
            notes: self.notes,
            lines: self
                .lines
                .into_iter()
                .map(LineRequestDto::into_line_request)
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCreditNoteRequest {
    pub invoice_id: Uuid,
    #[validate(length(min = 1, message = "a credit note requires a reason"))]
    pub reason: String,
    pub notes: Option<String>,
    /// Lines to credit; omit to credit the full invoice
    pub lines: Option<Vec<LineRequestDto>>,
}

impl CreateCreditNoteRequest {
    pub fn into_command(self) -> CreateCreditNote {
        CreateCreditNote {
            invoice_id: core_kernel::DocumentId::from_uuid(self.invoice_id),
            reason: self.reason,
            notes: self.notes,
            lines: self.lines.map(|lines| {
                lines
                    .into_iter()
                    .map(LineRequestDto::into_line_request)
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub tax_class: String,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
}

impl From<DocumentLine> for DocumentLineResponse {
    fn from(line: DocumentLine) -> Self {
        Self {
            id: *line.id.as_uuid(),
            product_id: *line.product_id.as_uuid(),
            product_name: line.product_name,
            description: line.description,
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            line_total: line.line_total.amount(),
            tax_class: line.tax_class,
            tax_rate: line.tax_rate.as_decimal(),
            tax_amount: line.tax_amount.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub kind: String,
    pub document_number: String,
    pub establishment_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub issue_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub lines: Vec<DocumentLineResponse>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn kind_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Invoice => "INVOICE",
        DocumentKind::CreditNote => "CREDIT_NOTE",
    }
}

fn status_label(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Draft => "DRAFT",
        DocumentStatus::Issued => "ISSUED",
        DocumentStatus::Cancelled => "CANCELLED",
    }
}

fn amount(money: &Money) -> Decimal {
    money.amount()
}

impl From<BillingDocument> for DocumentResponse {
    fn from(document: BillingDocument) -> Self {
        Self {
            id: *document.id.as_uuid(),
            kind: kind_label(document.kind).to_string(),
            document_number: document.document_number,
            establishment_id: *document.establishment_id.as_uuid(),
            order_id: document.order_id.map(|id| *id.as_uuid()),
            customer_id: *document.customer_id.as_uuid(),
            vendor_id: *document.vendor_id.as_uuid(),
            issue_date: document.issue_date,
            due_date: document.due_date,
            currency: document.currency.code().to_string(),
            lines: document
                .lines
                .into_iter()
                .map(DocumentLineResponse::from)
                .collect(),
            subtotal: amount(&document.subtotal),
            tax_amount: amount(&document.tax_amount),
            total_amount: amount(&document.total_amount),
            status: status_label(document.status).to_string(),
            reference_document_id: document.reference_document_id.map(|id| *id.as_uuid()),
            po_number: document.po_number,
            reason: document.reason,
            notes: document.notes,
            pdf_location: document.pdf_location,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PdfUrlResponse {
    pub url: String,
}
