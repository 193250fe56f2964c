//! Order repository, scoped to what the payments domain needs

use async_trait::async_trait;
use core_kernel::{AccountId, Currency, DomainPort, Money, OrderId, PortError};
use domain_payments::{OrderStatus, OrderStore, OrderSummary};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{corrupt, map_sqlx};

/// PostgreSQL-backed [`OrderStore`]
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    buyer_account_id: Uuid,
    po_number: Option<String>,
    total_amount: Decimal,
    currency: String,
    status: String,
}

fn status_to_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "PENDING",
        OrderStatus::Placed => "PLACED",
        OrderStatus::Cancelled => "CANCELLED",
    }
}

fn status_from_str(value: &str) -> Result<OrderStatus, PortError> {
    match value {
        "PENDING" => Ok(OrderStatus::Pending),
        "PLACED" => Ok(OrderStatus::Placed),
        "CANCELLED" => Ok(OrderStatus::Cancelled),
        other => Err(corrupt(format!("Unknown order status '{}'", other))),
    }
}

impl OrderRow {
    fn into_summary(self) -> Result<OrderSummary, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(OrderSummary {
            id: OrderId::from_uuid(self.id),
            buyer_account_id: AccountId::from_uuid(self.buyer_account_id),
            po_number: self.po_number,
            total_amount: Money::new(self.total_amount, currency),
            status: status_from_str(&self.status)?,
        })
    }
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgOrderStore {}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn get(&self, id: OrderId) -> Result<Option<OrderSummary>, PortError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, buyer_account_id, po_number, total_amount, currency, status
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(OrderRow::into_summary).transpose()
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), PortError> {
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status_to_str(status))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("Order", id));
        }
        Ok(())
    }
}
