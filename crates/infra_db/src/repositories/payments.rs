//! Payment repository
//!
//! The idempotency claim is `INSERT ... ON CONFLICT DO NOTHING` against
//! the unique idempotency key: exactly one of any set of concurrent claims
//! inserts its row, and every loser reads the winner's row back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{Currency, DomainPort, Money, OrderId, PaymentId, PortError};
use domain_payments::{ClaimOutcome, Payment, PaymentMethod, PaymentStatus, PaymentStore};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{corrupt, map_sqlx};

/// PostgreSQL-backed [`PaymentStore`]
#[derive(Debug, Clone)]
pub struct PgPaymentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    idempotency_key: String,
    method: String,
    gateway_reference: Option<String>,
    amount: Decimal,
    currency: String,
    status: String,
    gateway_response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn method_to_str(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Wallet => "WALLET",
        PaymentMethod::Card => "CARD",
        PaymentMethod::BankTransfer => "BANK_TRANSFER",
    }
}

fn method_from_str(value: &str) -> Result<PaymentMethod, PortError> {
    match value {
        "WALLET" => Ok(PaymentMethod::Wallet),
        "CARD" => Ok(PaymentMethod::Card),
        "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
        other => Err(corrupt(format!("Unknown payment method '{}'", other))),
    }
}

fn status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "PENDING",
        PaymentStatus::Processing => "PROCESSING",
        PaymentStatus::Completed => "COMPLETED",
        PaymentStatus::Failed => "FAILED",
        PaymentStatus::Cancelled => "CANCELLED",
        PaymentStatus::Refunded => "REFUNDED",
    }
}

fn status_from_str(value: &str) -> Result<PaymentStatus, PortError> {
    match value {
        "PENDING" => Ok(PaymentStatus::Pending),
        "PROCESSING" => Ok(PaymentStatus::Processing),
        "COMPLETED" => Ok(PaymentStatus::Completed),
        "FAILED" => Ok(PaymentStatus::Failed),
        "CANCELLED" => Ok(PaymentStatus::Cancelled),
        "REFUNDED" => Ok(PaymentStatus::Refunded),
        other => Err(corrupt(format!("Unknown payment status '{}'", other))),
    }
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(Payment {
            id: PaymentId::from_uuid(self.id),
            order_id: OrderId::from_uuid(self.order_id),
            idempotency_key: self.idempotency_key,
            method: method_from_str(&self.method)?,
            gateway_reference: self.gateway_reference,
            amount: Money::new(self.amount, currency),
            status: status_from_str(&self.status)?,
            gateway_response: self.gateway_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, order_id, idempotency_key, method, gateway_reference,
           amount, currency, status, gateway_response, created_at, updated_at
    FROM payments
"#;

impl PgPaymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgPaymentStore {}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert_new(&self, payment: Payment) -> Result<ClaimOutcome, PortError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, idempotency_key, method, gateway_reference,
                amount, currency, status, gateway_response, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(&payment.idempotency_key)
        .bind(method_to_str(payment.method))
        .bind(&payment.gateway_reference)
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(status_to_str(payment.status))
        .bind(&payment.gateway_response)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if inserted.rows_affected() == 1 {
            return Ok(ClaimOutcome::Created(payment));
        }

        let existing = self
            .find_by_idempotency_key(&payment.idempotency_key)
            .await?
            .ok_or_else(|| {
                PortError::conflict(format!(
                    "Idempotency key '{}' is claimed but its payment is not visible",
                    payment.idempotency_key
                ))
            })?;
        Ok(ClaimOutcome::Existing(existing))
    }

    async fn update(&self, payment: &Payment) -> Result<(), PortError> {
        let updated = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2, gateway_reference = $3, gateway_response = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(status_to_str(payment.status))
        .bind(&payment.gateway_reference)
        .bind(&payment.gateway_response)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("Payment", payment.id));
        }
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, PortError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_PAYMENT))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.map(PaymentRow::into_payment).transpose()
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>, PortError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE idempotency_key = $1", SELECT_PAYMENT))
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.map(PaymentRow::into_payment).transpose()
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{} WHERE order_id = $1 ORDER BY created_at DESC",
            SELECT_PAYMENT
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }
}
