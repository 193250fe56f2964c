//! Tax rate repository
//!
//! The non-overlap guarantee for effective ranges is enforced by a GiST
//! exclusion constraint; a violating publish surfaces as a conflict.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_kernel::{DomainPort, EffectivePeriod, PortError, Rate};
use domain_invoicing::{TaxRate, TaxRateStore};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::{corrupt, map_sqlx};

/// PostgreSQL-backed [`TaxRateStore`]
#[derive(Debug, Clone)]
pub struct PgTaxRateStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TaxRateRow {
    country_code: String,
    tax_class: String,
    rate: Decimal,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
}

impl TaxRateRow {
    fn into_rate(self) -> Result<TaxRate, PortError> {
        let effective = match self.effective_to {
            Some(to) => EffectivePeriod::new(self.effective_from, to).map_err(|e| {
                corrupt(format!(
                    "Stored tax rate period is invalid for {}/{}: {}",
                    self.country_code, self.tax_class, e
                ))
            })?,
            None => EffectivePeriod::starting(self.effective_from),
        };
        Ok(TaxRate {
            country_code: self.country_code,
            tax_class: self.tax_class,
            rate: Rate::new(self.rate),
            effective,
        })
    }
}

impl PgTaxRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgTaxRateStore {}

#[async_trait]
impl TaxRateStore for PgTaxRateStore {
    async fn applicable(
        &self,
        country_code: &str,
        tax_class: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<TaxRate>, PortError> {
        let rows: Vec<TaxRateRow> = sqlx::query_as(
            r#"
            SELECT country_code, tax_class, rate, effective_from, effective_to
            FROM tax_rates
            WHERE country_code = $1
              AND tax_class = $2
              AND effective_from <= $3
              AND (effective_to IS NULL OR effective_to >= $3)
            ORDER BY effective_from DESC
            "#,
        )
        .bind(country_code)
        .bind(tax_class)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(TaxRateRow::into_rate).collect()
    }

    async fn publish(&self, rate: TaxRate) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO tax_rates (country_code, tax_class, rate, effective_from, effective_to)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&rate.country_code)
        .bind(&rate.tax_class)
        .bind(rate.rate.as_decimal())
        .bind(rate.effective.effective_from)
        .bind(rate.effective.effective_to)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}
