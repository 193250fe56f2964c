//! Append-only wallet transactions

use chrono::{DateTime, Utc};
use core_kernel::{Money, PaymentId, WalletId, WalletTransactionId};
use serde::{Deserialize, Serialize};

/// The kind of balance movement a transaction records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Funds added by the account holder
    TopUp,
    /// Funds consumed by a payment
    Debit,
    /// Funds returned from a refunded payment
    Refund,
}

impl TransactionType {
    /// The sign this transaction type contributes to the balance
    pub fn sign(&self) -> i64 {
        match self {
            TransactionType::TopUp | TransactionType::Refund => 1,
            TransactionType::Debit => -1,
        }
    }
}

/// One immutable ledger entry
///
/// Transactions are never updated or deleted; corrections are expressed as
/// new entries (a refund reversing a debit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique identifier
    pub id: WalletTransactionId,
    /// Wallet the entry belongs to
    pub wallet_id: WalletId,
    /// Movement kind
    pub transaction_type: TransactionType,
    /// Absolute amount moved; the sign comes from the type
    pub amount: Money,
    /// Balance immediately after this entry was applied
    pub balance_after: Money,
    /// Payment that caused a debit or refund
    pub payment_id: Option<PaymentId>,
    /// Human-readable context
    pub description: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Builds an entry for a movement that was just applied
    pub fn record(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Money,
        balance_after: Money,
    ) -> Self {
        Self {
            id: WalletTransactionId::new_v7(),
            wallet_id,
            transaction_type,
            amount,
            balance_after,
            payment_id: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Links the entry to the payment that caused it
    pub fn with_payment(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
