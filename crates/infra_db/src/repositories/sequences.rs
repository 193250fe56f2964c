//! Sequence counter repository
//!
//! Allocation is one `UPDATE ... RETURNING`: the row lock serializes
//! concurrent increments, so every caller sees a distinct value and the
//! sequence stays gap-free under any concurrency.

use async_trait::async_trait;
use core_kernel::{DomainPort, EstablishmentId, PortError};
use domain_invoicing::{Allocation, SequenceCounter, SequenceStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::map_sqlx;

/// PostgreSQL-backed [`SequenceStore`]
#[derive(Debug, Clone)]
pub struct PgSequenceStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SequenceRow {
    pub(crate) establishment_id: Uuid,
    pub(crate) sequence_name: String,
    pub(crate) current_value: i64,
    pub(crate) prefix: Option<String>,
    pub(crate) suffix: Option<String>,
    pub(crate) format_pattern: Option<String>,
    pub(crate) is_active: bool,
}

impl SequenceRow {
    pub(crate) fn into_counter(self) -> SequenceCounter {
        SequenceCounter {
            establishment_id: EstablishmentId::from_uuid(self.establishment_id),
            sequence_name: self.sequence_name,
            current_value: self.current_value,
            prefix: self.prefix,
            suffix: self.suffix,
            format_pattern: self.format_pattern,
            is_active: self.is_active,
        }
    }
}

impl PgSequenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgSequenceStore {}

#[async_trait]
impl SequenceStore for PgSequenceStore {
    async fn allocate(
        &self,
        establishment_id: EstablishmentId,
        sequence_name: &str,
    ) -> Result<Allocation, PortError> {
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
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let row = row.ok_or_else(|| {
            PortError::not_found(
                "SequenceCounter",
                format!("{}/{}", establishment_id, sequence_name),
            )
        })?;

        let value = row.current_value;
        Ok(Allocation {
            counter: row.into_counter(),
            value,
        })
    }

    async fn provision(&self, counter: SequenceCounter) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO sequence_counters (
                establishment_id, sequence_name, current_value,
                prefix, suffix, format_pattern, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(counter.establishment_id.as_uuid())
        .bind(&counter.sequence_name)
        .bind(counter.current_value)
        .bind(&counter.prefix)
        .bind(&counter.suffix)
        .bind(&counter.format_pattern)
        .bind(counter.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}
