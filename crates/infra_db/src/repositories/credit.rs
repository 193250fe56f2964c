//! Credit limit repository
//!
//! Balance adjustments are single UPDATE statements: increases add
//! unconditionally or conditionally against the approved limit, decreases
//! clamp at zero with GREATEST. Row locks serialize concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{
    AccountId, CreditLimitId, Currency, DomainPort, DunningEventId, Money, PortError,
};
use domain_credit::{CreditDunningEvent, CreditLimit, CreditStore};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{corrupt, map_sqlx};

/// PostgreSQL-backed [`CreditStore`]
#[derive(Debug, Clone)]
pub struct PgCreditStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CreditLimitRow {
    id: Uuid,
    account_id: Uuid,
    cost_center_id: Option<String>,
    approved_limit: Decimal,
    current_balance: Decimal,
    currency: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DunningEventRow {
    id: Uuid,
    credit_limit_id: Uuid,
    account_id: Uuid,
    amount_over: Decimal,
    currency: String,
    occurred_at: DateTime<Utc>,
    resolved: bool,
    resolved_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    resolution_notes: Option<String>,
}

impl CreditLimitRow {
    fn into_limit(self) -> Result<CreditLimit, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(CreditLimit {
            id: CreditLimitId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            cost_center_id: self.cost_center_id,
            approved_limit: Money::new(self.approved_limit, currency),
            current_balance: Money::new(self.current_balance, currency),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DunningEventRow {
    fn into_event(self) -> Result<CreditDunningEvent, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(CreditDunningEvent {
            id: DunningEventId::from_uuid(self.id),
            credit_limit_id: CreditLimitId::from_uuid(self.credit_limit_id),
            account_id: AccountId::from_uuid(self.account_id),
            amount_over: Money::new(self.amount_over, currency),
            occurred_at: self.occurred_at,
            resolved: self.resolved,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at,
            resolution_notes: self.resolution_notes,
        })
    }
}

const SELECT_LIMIT: &str = r#"
    SELECT id, account_id, cost_center_id, approved_limit, current_balance,
           currency, is_active, created_at, updated_at
    FROM credit_limits
"#;

impl PgCreditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgCreditStore {}

#[async_trait]
impl CreditStore for PgCreditStore {
    async fn get(&self, account_id: AccountId) -> Result<Option<CreditLimit>, PortError> {
        let row: Option<CreditLimitRow> =
            sqlx::query_as(&format!("{} WHERE account_id = $1", SELECT_LIMIT))
                .bind(account_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.map(CreditLimitRow::into_limit).transpose()
    }

    async fn open(&self, limit: CreditLimit) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO credit_limits (
                id, account_id, cost_center_id, approved_limit, current_balance,
                currency, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(limit.id.as_uuid())
        .bind(limit.account_id.as_uuid())
        .bind(&limit.cost_center_id)
        .bind(limit.approved_limit.amount())
        .bind(limit.current_balance.amount())
        .bind(limit.currency().code())
        .bind(limit.is_active)
        .bind(limit.created_at)
        .bind(limit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn increase(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, PortError> {
        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            UPDATE credit_limits
            SET current_balance = current_balance + $2, updated_at = NOW()
            WHERE account_id = $1 AND is_active
            RETURNING id, account_id, cost_center_id, approved_limit, current_balance,
                      currency, is_active, created_at, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.ok_or_else(|| PortError::not_found("CreditLimit", account_id))?
            .into_limit()
    }

    async fn try_increase_within_limit(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<Option<CreditLimit>, PortError> {
        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            UPDATE credit_limits
            SET current_balance = current_balance + $2, updated_at = NOW()
            WHERE account_id = $1 AND is_active
              AND current_balance + $2 <= approved_limit
            RETURNING id, account_id, cost_center_id, approved_limit, current_balance,
                      currency, is_active, created_at, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(CreditLimitRow::into_limit).transpose()
    }

    async fn decrease(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, PortError> {
        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            UPDATE credit_limits
            SET current_balance = GREATEST(current_balance - $2, 0), updated_at = NOW()
            WHERE account_id = $1
            RETURNING id, account_id, cost_center_id, approved_limit, current_balance,
                      currency, is_active, created_at, updated_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.ok_or_else(|| PortError::not_found("CreditLimit", account_id))?
            .into_limit()
    }

    async fn record_event(&self, event: CreditDunningEvent) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO credit_dunning_events (
                id, credit_limit_id, account_id, amount_over, currency,
                occurred_at, resolved, resolved_by, resolved_at, resolution_notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.credit_limit_id.as_uuid())
        .bind(event.account_id.as_uuid())
        .bind(event.amount_over.amount())
        .bind(event.amount_over.currency().code())
        .bind(event.occurred_at)
        .bind(event.resolved)
        .bind(&event.resolved_by)
        .bind(event.resolved_at)
        .bind(&event.resolution_notes)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn active_events(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<CreditDunningEvent>, PortError> {
        let rows: Vec<DunningEventRow> = sqlx::query_as(
            r#"
            SELECT id, credit_limit_id, account_id, amount_over, currency,
                   occurred_at, resolved, resolved_by, resolved_at, resolution_notes
            FROM credit_dunning_events
            WHERE account_id = $1 AND NOT resolved
            ORDER BY occurred_at
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(DunningEventRow::into_event).collect()
    }

    async fn get_event(
        &self,
        event_id: DunningEventId,
    ) -> Result<Option<CreditDunningEvent>, PortError> {
        let row: Option<DunningEventRow> = sqlx::query_as(
            r#"
            SELECT id, credit_limit_id, account_id, amount_over, currency,
                   occurred_at, resolved, resolved_by, resolved_at, resolution_notes
            FROM credit_dunning_events
            WHERE id = $1
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(DunningEventRow::into_event).transpose()
    }

    async fn update_event(&self, event: &CreditDunningEvent) -> Result<(), PortError> {
        let updated = sqlx::query(
            r#"
            UPDATE credit_dunning_events
            SET resolved = $2, resolved_by = $3, resolved_at = $4, resolution_notes = $5
            WHERE id = $1
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.resolved)
        .bind(&event.resolved_by)
        .bind(event.resolved_at)
        .bind(&event.resolution_notes)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return Err(PortError::not_found("CreditDunningEvent", event.id));
        }
        Ok(())
    }
}
