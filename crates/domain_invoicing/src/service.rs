//! Invoicing application service
//!
//! Orchestrates document creation and lifecycle over the storage ports.
//! The transactional boundary is [`DocumentStore::create`]: number
//! allocation and persistence are atomic inside the store. PDF rendering
//! and notifications run after that commit, best-effort; their failure is
//! logged and never rolls back the document.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use core_kernel::{
    AccountId, Currency, DocumentId, EstablishmentId, Money, NotificationSender,
    Notification, OrderId, PdfRenderer, ProductId,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::document::{BillingDocument, DocumentKind, DocumentLine, DocumentStatus};
use crate::error::InvoicingError;
use crate::ports::{DocumentStore, EstablishmentStore, NewDocument};
use crate::tax::TaxRateResolver;

/// Signed PDF links expire after an hour
const PDF_URL_TTL: Duration = Duration::from_secs(3600);

/// One line of a creation request
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax_class: String,
}

/// Command to create a draft invoice
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub establishment_id: EstablishmentId,
    pub order_id: Option<OrderId>,
    pub customer_id: AccountId,
    pub vendor_id: AccountId,
    /// Defaults to today when absent
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Currency,
    pub po_number: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LineRequest>,
}

/// Command to create a draft credit note against an issued invoice
#[derive(Debug, Clone)]
pub struct CreateCreditNote {
    /// The invoice being credited
    pub invoice_id: DocumentId,
    pub reason: String,
    pub notes: Option<String>,
    /// Lines to credit; `None` credits the full invoice
    pub lines: Option<Vec<LineRequest>>,
}

/// Fiscal document orchestration
#[derive(Clone)]
pub struct InvoicingService {
    documents: Arc<dyn DocumentStore>,
    establishments: Arc<dyn EstablishmentStore>,
    resolver: TaxRateResolver,
    pdf: Arc<dyn PdfRenderer>,
    notifier: Arc<dyn NotificationSender>,
}

impl InvoicingService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        establishments: Arc<dyn EstablishmentStore>,
        resolver: TaxRateResolver,
        pdf: Arc<dyn PdfRenderer>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            documents,
            establishments,
            resolver,
            pdf,
            notifier,
        }
    }

    /// Creates a draft invoice with its number already allocated
    ///
    /// Tax rates are resolved per line as of the issue date, against the
    /// establishment's country, and snapshotted into the lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown establishment, `Validation` for an
    /// inactive establishment or an empty/invalid line set.
    pub async fn create_invoice(
        &self,
        cmd: CreateInvoice,
    ) -> Result<BillingDocument, InvoicingError> {
        let establishment = self
            .establishments
            .get(cmd.establishment_id)
            .await?
            .ok_or_else(|| {
                InvoicingError::not_found(format!(
                    "Establishment {} not found",
                    cmd.establishment_id
                ))
            })?;

        if !establishment.is_active {
            return Err(InvoicingError::validation(format!(
                "Establishment {} is inactive",
                establishment.id
            )));
        }
        if cmd.lines.is_empty() {
            return Err(InvoicingError::validation(
                "An invoice requires at least one line",
            ));
        }

        let issue_date = cmd.issue_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut lines = Vec::with_capacity(cmd.lines.len());
        for request in &cmd.lines {
            let rate = self
                .resolver
                .rate_for(&establishment.country_code, &request.tax_class, issue_date)
                .await?;
            lines.push(DocumentLine::compute(
                request.product_id,
                request.product_name.clone(),
                request.description.clone(),
                request.quantity,
                Money::new(request.unit_price, cmd.currency),
                request.tax_class.clone(),
                rate,
            )?);
        }

        let document = self
            .documents
            .create(NewDocument {
                kind: DocumentKind::Invoice,
                establishment_id: cmd.establishment_id,
                order_id: cmd.order_id,
                customer_id: cmd.customer_id,
                vendor_id: cmd.vendor_id,
                issue_date,
                due_date: cmd.due_date,
                currency: cmd.currency,
                lines,
                reference_document_id: None,
                po_number: cmd.po_number,
                reason: None,
                notes: cmd.notes,
            })
            .await?;

        info!(
            document_id = %document.id,
            document_number = %document.document_number,
            total = %document.total_amount,
            "Created draft invoice"
        );

        Ok(self.attach_pdf(document).await)
    }

    /// Creates a draft credit note referencing an issued invoice
    ///
    /// Rates for explicitly provided lines are resolved as of the ORIGINAL
    /// invoice's issue date, so the credit mirrors the tax actually charged.
    /// When no lines are given the full invoice is credited using the rates
    /// snapshotted on its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown invoice, `Validation` when the
    /// referenced document is not an invoice, and `InvalidState` when the
    /// invoice is not issued.
    pub async fn create_credit_note(
        &self,
        cmd: CreateCreditNote,
    ) -> Result<BillingDocument, InvoicingError> {
        let invoice = self.load_document(cmd.invoice_id).await?;

        if invoice.kind != DocumentKind::Invoice {
            return Err(InvoicingError::validation(format!(
                "Document {} is not an invoice",
                invoice.id
            )));
        }
        if invoice.status != DocumentStatus::Issued {
            return Err(InvoicingError::invalid_state(format!(
                "Only issued invoices can be credited, invoice {} is {:?}",
                invoice.id, invoice.status
            )));
        }

        let establishment = self
            .establishments
            .get(invoice.establishment_id)
            .await?
            .ok_or_else(|| {
                InvoicingError::not_found(format!(
                    "Establishment {} not found",
                    invoice.establishment_id
                ))
            })?;

        let lines = match cmd.lines {
            Some(requests) => {
                if requests.is_empty() {
                    return Err(InvoicingError::validation(
                        "A partial credit note requires at least one line",
                    ));
                }
                let mut lines = Vec::with_capacity(requests.len());
                for request in &requests {
                    let rate = self
                        .resolver
                        .rate_for(
                            &establishment.country_code,
                            &request.tax_class,
                            invoice.issue_date,
                        )
                        .await?;
                    lines.push(DocumentLine::compute(
                        request.product_id,
                        request.product_name.clone(),
                        request.description.clone(),
                        request.quantity,
                        Money::new(request.unit_price, invoice.currency),
                        request.tax_class.clone(),
                        rate,
                    )?);
                }
                lines
            }
            None => invoice
                .lines
                .iter()
                .map(|line| {
                    DocumentLine::compute(
                        line.product_id,
                        line.product_name.clone(),
                        line.description.clone(),
                        line.quantity,
                        line.unit_price,
                        line.tax_class.clone(),
                        line.tax_rate,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let document = self
            .documents
            .create(NewDocument {
                kind: DocumentKind::CreditNote,
                establishment_id: invoice.establishment_id,
                order_id: invoice.order_id,
                customer_id: invoice.customer_id,
                vendor_id: invoice.vendor_id,
                issue_date: Utc::now().date_naive(),
                due_date: None,
                currency: invoice.currency,
                lines,
                reference_document_id: Some(invoice.id),
                po_number: invoice.po_number.clone(),
                reason: Some(cmd.reason),
                notes: cmd.notes,
            })
            .await?;

        info!(
            document_id = %document.id,
            document_number = %document.document_number,
            invoice_id = %invoice.id,
            total = %document.total_amount,
            "Created draft credit note"
        );

        Ok(self.attach_pdf(document).await)
    }

    /// Issues a draft invoice, making it legally effective
    ///
    /// The customer is notified after the transition commits, best-effort.
    pub async fn issue_invoice(&self, id: DocumentId) -> Result<BillingDocument, InvoicingError> {
        let document = self.issue_document(id, DocumentKind::Invoice).await?;

        let notification = Notification {
            account_id: document.customer_id.to_string(),
            subject: format!("Invoice {} issued", document.document_number),
            body: format!(
                "Invoice {} for {} has been issued.",
                document.document_number, document.total_amount
            ),
        };
        if let Err(error) = self.notifier.send(notification).await {
            warn!(
                document_id = %document.id,
                %error,
                "Failed to send invoice issued notification"
            );
        }

        Ok(document)
    }

    /// Issues a draft credit note
    pub async fn issue_credit_note(
        &self,
        id: DocumentId,
    ) -> Result<BillingDocument, InvoicingError> {
        self.issue_document(id, DocumentKind::CreditNote).await
    }

    /// Cancels a draft document; its allocated number stays consumed
    pub async fn cancel_document(
        &self,
        id: DocumentId,
    ) -> Result<BillingDocument, InvoicingError> {
        let mut document = self.load_document(id).await?;
        document.cancel()?;

        let updated = self
            .documents
            .transition_status(id, DocumentStatus::Draft, DocumentStatus::Cancelled)
            .await
            .map_err(map_transition_conflict)?;

        info!(
            document_id = %updated.id,
            document_number = %updated.document_number,
            "Cancelled draft document"
        );

        Ok(updated)
    }

    /// Fetches a document by id
    pub async fn get_document(&self, id: DocumentId) -> Result<BillingDocument, InvoicingError> {
        self.load_document(id).await
    }

    /// Returns a signed, time-limited URL for the document's PDF
    ///
    /// Renders and uploads the PDF first if an earlier best-effort attempt
    /// failed.
    pub async fn pdf_url(&self, id: DocumentId) -> Result<String, InvoicingError> {
        let document = self.load_document(id).await?;

        let storage_key = match document.pdf_location {
            Some(key) => key,
            None => {
                let key = self
                    .pdf
                    .generate_and_upload(
                        &document.id.to_string(),
                        &document.document_number,
                    )
                    .await?;
                self.documents.set_pdf_location(id, &key).await?;
                key
            }
        };

        Ok(self.pdf.signed_url(&storage_key, PDF_URL_TTL).await?)
    }

    async fn issue_document(
        &self,
        id: DocumentId,
        expected_kind: DocumentKind,
    ) -> Result<BillingDocument, InvoicingError> {
        let mut document = self.load_document(id).await?;

        if document.kind != expected_kind {
            return Err(InvoicingError::validation(format!(
                "Document {} is a {:?}, not a {:?}",
                id, document.kind, expected_kind
            )));
        }
        document.issue()?;

        let updated = self
            .documents
            .transition_status(id, DocumentStatus::Draft, DocumentStatus::Issued)
            .await
            .map_err(map_transition_conflict)?;

        info!(
            document_id = %updated.id,
            document_number = %updated.document_number,
            kind = ?updated.kind,
            "Issued document"
        );

        Ok(updated)
    }

    async fn load_document(&self, id: DocumentId) -> Result<BillingDocument, InvoicingError> {
        self.documents
            .get(id)
            .await?
            .ok_or_else(|| InvoicingError::not_found(format!("Document {} not found", id)))
    }

    /// Best-effort PDF render after the creation transaction committed
    ///
    /// A failure here leaves `pdf_location` empty; `pdf_url` retries later.
    async fn attach_pdf(&self, mut document: BillingDocument) -> BillingDocument {
        match self
            .pdf
            .generate_and_upload(&document.id.to_string(), &document.document_number)
            .await
        {
            Ok(key) => {
                if let Err(error) = self.documents.set_pdf_location(document.id, &key).await {
                    warn!(
                        document_id = %document.id,
                        %error,
                        "Failed to record PDF location"
                    );
                } else {
                    document.pdf_location = Some(key);
                }
            }
            Err(error) => {
                warn!(
                    document_id = %document.id,
                    %error,
                    "PDF generation failed, document remains without a PDF"
                );
            }
        }
        document
    }
}

/// A lost transition race is a state error, not a storage failure
fn map_transition_conflict(error: core_kernel::PortError) -> InvoicingError {
    match error {
        core_kernel::PortError::Conflict { message } => InvoicingError::invalid_state(message),
        other => other.into(),
    }
}
