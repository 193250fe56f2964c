//! Testcontainers-backed Postgres for integration tests.
//!
//! Spins up a throwaway `postgres:16-alpine`, waits for readiness, and
//! applies the embedded migrations so tests see the same schema the
//! server boots with.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

const IMAGE: &str = "postgres";
const TAG: &str = "16-alpine";
const USER: &str = "test_user";
const PASSWORD: &str = "test_password";
const DATABASE: &str = "marketplace_test";

// FK order matters: children first.
const TABLES: &[&str] = &[
    "credit_dunning_events",
    "credit_limits",
    "payments",
    "orders",
    "wallet_transactions",
    "wallets",
    "document_lines",
    "billing_documents",
    "tax_rates",
    "sequence_counters",
    "establishments",
];

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A running Postgres container with a migrated schema and an open pool.
/// Dropping it tears the container down.
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub url: String,
    pub pool: PgPool,
}

impl TestDatabase {
    pub async fn new() -> Result<Self, BoxError> {
        // The image-level builders come first: `with_env_var` turns the
        // image into a ContainerRequest, which no longer has them.
        let container = GenericImage::new(IMAGE, TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", USER)
            .with_env_var("POSTGRES_PASSWORD", PASSWORD)
            .with_env_var("POSTGRES_DB", DATABASE)
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!("postgres://{USER}:{PASSWORD}@{host}:{port}/{DATABASE}");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await?;

        infra_db::MIGRATOR.run(&pool).await?;

        Ok(Self {
            _container: container,
            url,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Empties every table, keeping the schema. Lets tests that share a
    /// container start from a blank slate.
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        for table in TABLES {
            sqlx::query(&format!("TRUNCATE TABLE {table} CASCADE"))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

static SHARED: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// One container shared across a test binary. Call `clear_data` between
/// tests that write.
///
/// # Panics
///
/// Panics if the container or migrations fail, since no test can proceed
/// without the database.
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to start shared test database"),
            )
        })
        .await
        .clone()
}

/// A container of one's own, for tests that need full isolation.
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// Wraps a test body with an isolated database; the body sees `pool`.
#[macro_export]
macro_rules! db_test {
    ($name:ident, $body:expr) => {
        #[tokio::test]
        async fn $name() {
            let db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            let pool = db.pool();
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_covers_every_parent_after_its_children() {
        // payments reference orders; lines reference documents; events
        // reference limits. Each child must appear before its parent.
        let pos = |t: &str| TABLES.iter().position(|x| *x == t).unwrap();
        assert!(pos("payments") < pos("orders"));
        assert!(pos("document_lines") < pos("billing_documents"));
        assert!(pos("credit_dunning_events") < pos("credit_limits"));
        assert!(pos("wallet_transactions") < pos("wallets"));
    }
}
