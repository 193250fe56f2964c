//! Wallet repository
//!
//! Balance mutations and their ledger entries are written in one
//! transaction. Debits are conditional on the balance inside the UPDATE
//! itself, so concurrent debits against the same wallet can never drive
//! the balance negative; the non-negative check constraint is the last
//! line of defense.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{
    AccountId, Currency, DomainPort, Money, PaymentId, PortError, WalletId,
    WalletTransactionId,
};
use domain_wallet::{TransactionType, Wallet, WalletStore, WalletTransaction};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{corrupt, map_sqlx};

/// PostgreSQL-backed [`WalletStore`]
#[derive(Debug, Clone)]
pub struct PgWalletStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    account_id: Uuid,
    currency: String,
    balance: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    wallet_id: Uuid,
    transaction_type: String,
    amount: Decimal,
    balance_after: Decimal,
    currency: String,
    payment_id: Option<Uuid>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

fn type_to_str(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::TopUp => "TOP_UP",
        TransactionType::Debit => "DEBIT",
        TransactionType::Refund => "REFUND",
    }
}

fn type_from_str(value: &str) -> Result<TransactionType, PortError> {
    match value {
        "TOP_UP" => Ok(TransactionType::TopUp),
        "DEBIT" => Ok(TransactionType::Debit),
        "REFUND" => Ok(TransactionType::Refund),
        other => Err(corrupt(format!("Unknown transaction type '{}'", other))),
    }
}

impl WalletRow {
    fn into_wallet(self) -> Result<Wallet, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(Wallet {
            id: WalletId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            balance: Money::new(self.balance, currency),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TransactionRow {
    fn into_transaction(self) -> Result<WalletTransaction, PortError> {
        let currency = Currency::from_code(&self.currency)
            .map_err(|_| corrupt(format!("Unknown stored currency '{}'", self.currency)))?;
        Ok(WalletTransaction {
            id: WalletTransactionId::from_uuid(self.id),
            wallet_id: WalletId::from_uuid(self.wallet_id),
            transaction_type: type_from_str(&self.transaction_type)?,
            amount: Money::new(self.amount, currency),
            balance_after: Money::new(self.balance_after, currency),
            payment_id: self.payment_id.map(PaymentId::from_uuid),
            description: self.description,
            created_at: self.created_at,
        })
    }
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Postgres>,
        entry: &WalletTransaction,
    ) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                id, wallet_id, transaction_type, amount, balance_after,
                currency, payment_id, description, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.wallet_id.as_uuid())
        .bind(type_to_str(entry.transaction_type))
        .bind(entry.amount.amount())
        .bind(entry.balance_after.amount())
        .bind(entry.amount.currency().code())
        .bind(entry.payment_id.map(|id| *id.as_uuid()))
        .bind(&entry.description)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }
}

impl DomainPort for PgWalletStore {}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn get_or_create(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Wallet, PortError> {
        let fresh = Wallet::open(account_id, currency);

        // The conflict target makes creation race-safe: the loser of a
        // concurrent create simply reads the winner's row.
        sqlx::query(
            r#"
            INSERT INTO wallets (id, account_id, currency, balance, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $5)
            ON CONFLICT (account_id, currency) DO NOTHING
            "#,
        )
        .bind(fresh.id.as_uuid())
        .bind(account_id.as_uuid())
        .bind(currency.code())
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.get_by_account(account_id, currency)
            .await?
            .ok_or_else(|| PortError::not_found("Wallet", account_id))
    }

    async fn get_by_account(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Option<Wallet>, PortError> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, currency, balance, created_at, updated_at
            FROM wallets
            WHERE account_id = $1 AND currency = $2
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(currency.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(WalletRow::into_wallet).transpose()
    }

    async fn credit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        transaction_type: TransactionType,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<(Wallet, WalletTransaction), PortError> {
        if transaction_type == TransactionType::Debit {
            return Err(PortError::validation(
                "credit() cannot apply a DEBIT entry",
            ));
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, account_id, currency, balance, created_at, updated_at
            "#,
        )
        .bind(wallet_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let wallet = row
            .ok_or_else(|| PortError::not_found("Wallet", wallet_id))?
            .into_wallet()?;

        let mut entry =
            WalletTransaction::record(wallet.id, transaction_type, amount, wallet.balance);
        entry.payment_id = payment_id;
        entry.description = description;
        Self::insert_entry(&mut tx, &entry).await?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok((wallet, entry))
    }

    async fn try_debit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<Option<(Wallet, WalletTransaction)>, PortError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            UPDATE wallets
            SET balance = balance - $2, updated_at = NOW()
            WHERE id = $1 AND balance >= $2
            RETURNING id, account_id, currency, balance, created_at, updated_at
            "#,
        )
        .bind(wallet_id.as_uuid())
        .bind(amount.amount())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let wallet = match row {
            Some(row) => row.into_wallet()?,
            None => return Ok(None),
        };

        let mut entry = WalletTransaction::record(
            wallet.id,
            TransactionType::Debit,
            amount,
            wallet.balance,
        );
        entry.payment_id = payment_id;
        entry.description = description;
        Self::insert_entry(&mut tx, &entry).await?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(Some((wallet, entry)))
    }

    async fn transactions(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<WalletTransaction>, PortError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, wallet_id, transaction_type, amount, balance_after,
                   currency, payment_id, description, created_at
            FROM wallet_transactions
            WHERE wallet_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(wallet_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter()
            .map(TransactionRow::into_transaction)
            .collect()
    }
}
