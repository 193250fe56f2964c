//! Storage port for the wallet domain
//!
//! The store owns atomicity: every balance mutation and its ledger entry
//! are written in one store transaction, and debits are conditional so the
//! balance can never be driven negative, even under concurrent callers.

use async_trait::async_trait;
use core_kernel::{AccountId, Currency, DomainPort, Money, PaymentId, PortError, WalletId};

use crate::transaction::{TransactionType, WalletTransaction};
use crate::wallet::Wallet;

/// Wallet and ledger entry storage
#[async_trait]
pub trait WalletStore: DomainPort {
    /// Fetches the wallet for (account, currency), creating an empty one
    /// when none exists
    async fn get_or_create(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Wallet, PortError>;

    /// Fetches the wallet for (account, currency), if it exists
    async fn get_by_account(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Option<Wallet>, PortError>;

    /// Atomically increases the balance and appends the ledger entry
    ///
    /// `transaction_type` must be a crediting type (`TopUp` or `Refund`).
    async fn credit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        transaction_type: TransactionType,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<(Wallet, WalletTransaction), PortError>;

    /// Conditionally decreases the balance and appends the debit entry
    ///
    /// Returns `None` when the balance does not cover `amount`; in that
    /// case nothing is written. Concurrent debits are serialized by the
    /// store, so at most the covered subset succeeds.
    async fn try_debit(
        &self,
        wallet_id: WalletId,
        amount: Money,
        payment_id: Option<PaymentId>,
        description: Option<String>,
    ) -> Result<Option<(Wallet, WalletTransaction)>, PortError>;

    /// Returns the wallet's ledger entries, newest first
    async fn transactions(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, PortError>;
}
