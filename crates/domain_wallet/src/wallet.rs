//! Wallet aggregate

use chrono::{DateTime, Utc};
use core_kernel::{AccountId, Currency, Money, WalletId};
use serde::{Deserialize, Serialize};

/// A prepaid wallet holding one account's balance in one currency
///
/// The balance is derived state: it always equals the signed sum of the
/// wallet's transactions. It never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier
    pub id: WalletId,
    /// Owning account; at most one wallet per (account, currency)
    pub account_id: AccountId,
    /// Current balance, non-negative
    pub balance: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates an empty wallet for an account
    pub fn open(account_id: AccountId, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new_v7(),
            account_id,
            balance: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the balance covers the requested amount
    pub fn covers(&self, amount: &Money) -> bool {
        self.balance.currency() == amount.currency() && self.balance.amount() >= amount.amount()
    }
}
