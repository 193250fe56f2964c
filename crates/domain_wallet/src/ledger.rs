//! Wallet ledger operations
//!
//! The ledger validates amounts and maps store outcomes to domain
//! semantics. Insufficient funds on a debit is a normal outcome the payment
//! processor turns into a declined payment, not an error.

use std::sync::Arc;

use core_kernel::{AccountId, Currency, Money, PaymentId, WalletId};
use tracing::info;

use crate::error::WalletError;
use crate::ports::WalletStore;
use crate::transaction::{TransactionType, WalletTransaction};
use crate::wallet::Wallet;

/// The result of a debit attempt
#[derive(Debug, Clone)]
pub enum DebitOutcome {
    /// The balance covered the amount; the wallet reflects the new balance
    Debited(Wallet),
    /// The balance did not cover the amount; nothing was written
    InsufficientFunds { balance: Money, requested: Money },
}

impl DebitOutcome {
    /// Returns true if the debit was applied
    pub fn is_debited(&self) -> bool {
        matches!(self, DebitOutcome::Debited(_))
    }
}

/// Prepaid wallet ledger
#[derive(Clone)]
pub struct WalletLedger {
    wallets: Arc<dyn WalletStore>,
}

impl WalletLedger {
    pub fn new(wallets: Arc<dyn WalletStore>) -> Self {
        Self { wallets }
    }

    /// Adds funds to the account's wallet, creating the wallet when absent
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Validation` if the amount is not positive.
    pub async fn top_up(
        &self,
        account_id: AccountId,
        amount: Money,
        description: Option<String>,
    ) -> Result<Wallet, WalletError> {
        Self::require_positive(&amount)?;

        let wallet = self
            .wallets
            .get_or_create(account_id, amount.currency())
            .await?;
        let (wallet, _) = self
            .wallets
            .credit(wallet.id, amount, TransactionType::TopUp, None, description)
            .await?;

        info!(
            wallet_id = %wallet.id,
            account_id = %account_id,
            amount = %amount,
            balance = %wallet.balance,
            "Wallet topped up"
        );

        Ok(wallet)
    }

    /// Attempts to debit the account's wallet for a payment
    ///
    /// Insufficient funds (including a missing wallet) is reported as an
    /// outcome; nothing is written in that case.
    pub async fn debit(
        &self,
        account_id: AccountId,
        amount: Money,
        payment_id: PaymentId,
    ) -> Result<DebitOutcome, WalletError> {
        Self::require_positive(&amount)?;

        let wallet = match self
            .wallets
            .get_by_account(account_id, amount.currency())
            .await?
        {
            Some(wallet) => wallet,
            None => {
                return Ok(DebitOutcome::InsufficientFunds {
                    balance: Money::zero(amount.currency()),
                    requested: amount,
                })
            }
        };

        match self
            .wallets
            .try_debit(wallet.id, amount, Some(payment_id), None)
            .await?
        {
            Some((wallet, _)) => {
                info!(
                    wallet_id = %wallet.id,
                    payment_id = %payment_id,
                    amount = %amount,
                    balance = %wallet.balance,
                    "Wallet debited"
                );
                Ok(DebitOutcome::Debited(wallet))
            }
            None => {
                // The conditional update lost to a concurrent debit or the
                // balance never covered the amount; re-read for reporting.
                let current = self
                    .wallets
                    .get_by_account(account_id, amount.currency())
                    .await?
                    .map(|w| w.balance)
                    .unwrap_or_else(|| Money::zero(amount.currency()));
                Ok(DebitOutcome::InsufficientFunds {
                    balance: current,
                    requested: amount,
                })
            }
        }
    }

    /// Returns refunded funds to the account's wallet
    ///
    /// Refunds land in the wallet regardless of how the payment was
    /// originally routed, so the wallet is created when absent.
    pub async fn refund(
        &self,
        account_id: AccountId,
        amount: Money,
        payment_id: PaymentId,
    ) -> Result<Wallet, WalletError> {
        Self::require_positive(&amount)?;

        let wallet = self
            .wallets
            .get_or_create(account_id, amount.currency())
            .await?;
        let (wallet, _) = self
            .wallets
            .credit(
                wallet.id,
                amount,
                TransactionType::Refund,
                Some(payment_id),
                None,
            )
            .await?;

        info!(
            wallet_id = %wallet.id,
            payment_id = %payment_id,
            amount = %amount,
            balance = %wallet.balance,
            "Refund credited to wallet"
        );

        Ok(wallet)
    }

    /// Fetches the account's wallet, if one exists
    pub async fn wallet(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Option<Wallet>, WalletError> {
        Ok(self.wallets.get_by_account(account_id, currency).await?)
    }

    /// Returns the account's balance, zero when no wallet exists
    pub async fn balance(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Money, WalletError> {
        Ok(self
            .wallets
            .get_by_account(account_id, currency)
            .await?
            .map(|w| w.balance)
            .unwrap_or_else(|| Money::zero(currency)))
    }

    /// Returns the account's ledger entries, newest first
    pub async fn transactions(
        &self,
        account_id: AccountId,
        currency: Currency,
    ) -> Result<Vec<WalletTransaction>, WalletError> {
        let wallet = self
            .wallets
            .get_by_account(account_id, currency)
            .await?
            .ok_or_else(|| {
                WalletError::not_found(format!("No {} wallet for account {}", currency, account_id))
            })?;
        Ok(self.wallets.transactions(wallet.id).await?)
    }

    /// Returns a wallet's ledger entries by wallet id, newest first
    pub async fn entries(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, WalletError> {
        Ok(self.wallets.transactions(wallet_id).await?)
    }

    fn require_positive(amount: &Money) -> Result<(), WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::validation(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }
        Ok(())
    }
}
