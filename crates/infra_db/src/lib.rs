//! Infrastructure Database Layer
//!
//! PostgreSQL implementations of the domain storage ports, built on SQLx.
//! Each repository owns the SQL for one domain and relies on the database
//! for the atomicity the ports demand:
//!
//! - sequence allocation is a single `UPDATE ... RETURNING`, serialized by
//!   the row lock;
//! - wallet debits are conditional updates guarded by the balance check,
//!   with the ledger entry written in the same transaction;
//! - payment idempotency claims are `INSERT ... ON CONFLICT DO NOTHING`
//!   against the unique idempotency key;
//! - tax rate effective ranges are kept non-overlapping by an exclusion
//!   constraint.
//!
//! Schema migrations live under `migrations/` and run via `sqlx::migrate!`.
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, PgDocumentStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/marketplace")).await?;
//! let documents = PgDocumentStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{
    PgCreditStore, PgDocumentStore, PgEstablishmentStore, PgOrderStore, PgPaymentStore,
    PgSequenceStore, PgTaxRateStore, PgWalletStore,
};

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
