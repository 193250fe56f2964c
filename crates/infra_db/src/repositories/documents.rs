//! Billing document repository
//!
//! Document creation runs in one transaction: the sequence counter
//! increment, the document insert, and the line inserts either all commit
//! or all roll back. A failed insert therefore never consumes a document
//! number, which keeps the sequence gap-free.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    AccountId, Currency, DocumentId, DocumentLineId, DomainPort, EstablishmentId, Money,
    OrderId, PortError, ProductId, Rate,
};
use domain_invoicing::{
    format_document_number, BillingDocument, DocumentKind, DocumentLine, DocumentStatus,
    DocumentStore, NewDocument,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{corrupt, map_sqlx};
use crate::repositories::money_from_row;
use crate::repositories::sequences::SequenceRow;

/// PostgreSQL-backed [`DocumentStore`]
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    kind: String,
    document_number: String,
    establishment_id: Uuid,
    order_id: Option<Uuid>,
    customer_id: Uuid,
    vendor_id: Uuid,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    currency: String,
    subtotal: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    status: String,
    reference_document_id: Option<Uuid>,
    po_number: Option<String>,
    reason: Option<String>,
    notes: Option<String>,
    pdf_location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    description: Option<String>,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
    tax_class: String,
    tax_rate: Decimal,
    tax_amount: Decimal,
}

fn kind_to_str(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Invoice => "INVOICE",
        DocumentKind::CreditNote => "CREDIT_NOTE",
    }
}

fn kind_from_str(value: &str) -> Result<DocumentKind, PortError> {
    match value {
        "INVOICE" => Ok(DocumentKind::Invoice),
        "CREDIT_NOTE" => Ok(DocumentKind::CreditNote),
        other => Err(corrupt(format!("Unknown document kind '{}'", other))),
    }
}

fn status_to_str(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Draft => "DRAFT",
        DocumentStatus::Issued => "ISSUED",
        DocumentStatus::Cancelled => "CANCELLED",
    }
}

fn status_from_str(value: &str) -> Result<DocumentStatus, PortError> {
    match value {
        "DRAFT" => Ok(DocumentStatus::Draft),
        "ISSUED" => Ok(DocumentStatus::Issued),
        "CANCELLED" => Ok(DocumentStatus::Cancelled),
        other => Err(corrupt(format!("Unknown document status '{}'", other))),
    }
}

impl DocumentRow {
    fn into_document(self, lines: Vec<DocumentLine>) -> Result<BillingDocument, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(BillingDocument {
            id: DocumentId::from_uuid(self.id),
            kind: kind_from_str(&self.kind)?,
            document_number: self.document_number,
            establishment_id: EstablishmentId::from_uuid(self.establishment_id),
            order_id: self.order_id.map(OrderId::from_uuid),
            customer_id: AccountId::from_uuid(self.customer_id),
            vendor_id: AccountId::from_uuid(self.vendor_id),
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency,
            lines,
            subtotal: Money::new(self.subtotal, currency),
            tax_amount: Money::new(self.tax_amount, currency),
            total_amount: Money::new(self.total_amount, currency),
            status: status_from_str(&self.status)?,
            reference_document_id: self.reference_document_id.map(DocumentId::from_uuid),
            po_number: self.po_number,
            reason: self.reason,
            notes: self.notes,
            pdf_location: self.pdf_location,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl LineRow {
    fn into_line(self, currency: &str) -> Result<DocumentLine, PortError> {
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| corrupt(format!("Negative stored quantity {}", self.quantity)))?;
        Ok(DocumentLine {
            id: DocumentLineId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            product_name: self.product_name,
            description: self.description,
            quantity,
            unit_price: money_from_row(self.unit_price, currency)?,
            line_total: money_from_row(self.line_total, currency)?,
            tax_class: self.tax_class,
            tax_rate: Rate::new(self.tax_rate),
            tax_amount: money_from_row(self.tax_amount, currency)?,
        })
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Increments the counter inside the caller's transaction and formats
    /// the allocated value
    async fn allocate_number(
        tx: &mut Transaction<'_, Postgres>,
        establishment_id: EstablishmentId,
        sequence_name: &str,
    ) -> Result<String, PortError> {
        let row: Option<SequenceRow> = sqlx::query_as(
            r#"
            UPDATE sequence_counters
            SET current_value = current_value + 1
            WHERE establishment_id = $1 AND sequence_name = $2 AND is_active
            RETURNING establishment_id, sequence_name, current_value,
                      prefix, suffix, format_pattern, is_active
            "#,
        )
        .bind(establishment_id.as_uuid())
        .bind(sequence_name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx)?;

        let row = row.ok_or_else(|| {
            PortError::not_found(
                "SequenceCounter",
                format!("{}/{}", establishment_id, sequence_name),
            )
        })?;

        let value = row.current_value;
        Ok(format_document_number(&row.into_counter(), value))
    }

    async fn fetch_lines(&self, id: Uuid, currency: &str) -> Result<Vec<DocumentLine>, PortError> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, product_name, description, quantity,
                   unit_price, line_total, tax_class, tax_rate, tax_amount
            FROM document_lines
            WHERE document_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(|r| r.into_line(currency)).collect()
    }

    async fn fetch_document(&self, id: DocumentId) -> Result<Option<BillingDocument>, PortError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, kind, document_number, establishment_id, order_id,
                   customer_id, vendor_id, issue_date, due_date, currency,
                   subtotal, tax_amount, total_amount, status,
                   reference_document_id, po_number, reason, notes,
                   pdf_location, created_at, updated_at
            FROM billing_documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => {
                let lines = self.fetch_lines(row.id, &row.currency).await?;
                Ok(Some(row.into_document(lines)?))
            }
            None => Ok(None),
        }
    }
}

impl DomainPort for PgDocumentStore {}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, new: NewDocument) -> Result<BillingDocument, PortError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let number =
            Self::allocate_number(&mut tx, new.establishment_id, new.kind.sequence_name())
                .await?;
        let document = new.into_document(DocumentId::new_v7(), number, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO billing_documents (
                id, kind, document_number, establishment_id, order_id,
                customer_id, vendor_id, issue_date, due_date, currency,
                subtotal, tax_amount, total_amount, status,
                reference_document_id, po_number, reason, notes,
                pdf_location, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(kind_to_str(document.kind))
        .bind(&document.document_number)
        .bind(document.establishment_id.as_uuid())
        .bind(document.order_id.map(|id| *id.as_uuid()))
        .bind(document.customer_id.as_uuid())
        .bind(document.vendor_id.as_uuid())
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(document.currency.code())
        .bind(document.subtotal.amount())
        .bind(document.tax_amount.amount())
        .bind(document.total_amount.amount())
        .bind(status_to_str(document.status))
        .bind(document.reference_document_id.map(|id| *id.as_uuid()))
        .bind(&document.po_number)
        .bind(&document.reason)
        .bind(&document.notes)
        .bind(&document.pdf_location)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        for (line_no, line) in document.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO document_lines (
                    id, document_id, line_no, product_id, product_name,
                    description, quantity, unit_price, line_total,
                    tax_class, tax_rate, tax_amount
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(document.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(&line.description)
            .bind(line.quantity as i32)
            .bind(line.unit_price.amount())
            .bind(line.line_total.amount())
            .bind(&line.tax_class)
            .bind(line.tax_rate.as_decimal())
            .bind(line.tax_amount.amount())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }

        tx.commit().await.map_err(map_sqlx)?;
        Ok(document)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<BillingDocument>, PortError> {
        self.fetch_document(id).await
    }

    async fn transition_status(
        &self,
        id: DocumentId,
        from: DocumentStatus,
        to: DocumentStatus,
    ) -> Result<BillingDocument, PortError> {
        // Conditional on the current status: a concurrent transition makes
        // this a no-op instead of overwriting an issued document.
        let updated = sqlx::query(
            r#"
            UPDATE billing_documents
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(status_to_str(from))
        .bind(status_to_str(to))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return match self.fetch_document(id).await? {
                Some(current) => Err(PortError::conflict(format!(
                    "Document {} is {:?}, not {:?}",
                    id, current.status, from
                ))),
                None => Err(PortError::not_found("BillingDocument", id)),
            };
        }

        self.fetch_document(id)
            .await?
            .ok_or_else(|| PortError::not_found("BillingDocument", id))
    }

    async fn set_pdf_location(&self, id: DocumentId, storage_key: &str) -> Result<(), PortError> {
        let updated = sqlx::query(
            r#"
            UPDATE billing_documents
            SET pdf_location = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(storage_key)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("BillingDocument", id));
        }
        Ok(())
    }
}
