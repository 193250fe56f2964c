//! Establishment registry repository

use async_trait::async_trait;
use core_kernel::{DomainPort, EstablishmentId, PortError};
use domain_invoicing::{Establishment, EstablishmentStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::map_sqlx;

/// PostgreSQL-backed [`EstablishmentStore`]
#[derive(Debug, Clone)]
pub struct PgEstablishmentStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EstablishmentRow {
    id: Uuid,
    name: String,
    country_code: String,
    tax_id: Option<String>,
    is_active: bool,
}

impl EstablishmentRow {
    fn into_establishment(self) -> Establishment {
        Establishment {
            id: EstablishmentId::from_uuid(self.id),
            name: self.name,
            country_code: self.country_code,
            tax_id: self.tax_id,
            is_active: self.is_active,
        }
    }
}

impl PgEstablishmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgEstablishmentStore {}

#[async_trait]
impl EstablishmentStore for PgEstablishmentStore {
    async fn get(&self, id: EstablishmentId) -> Result<Option<Establishment>, PortError> {
        let row: Option<EstablishmentRow> = sqlx::query_as(
            r#"
            SELECT id, name, country_code, tax_id, is_active
            FROM establishments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(EstablishmentRow::into_establishment))
    }

    async fn register(&self, establishment: Establishment) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO establishments (id, name, country_code, tax_id, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(establishment.id.as_uuid())
        .bind(&establishment.name)
        .bind(&establishment.country_code)
        .bind(&establishment.tax_id)
        .bind(establishment.is_active)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}
