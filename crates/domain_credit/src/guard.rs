//! Credit limit guard
//!
//! Sits in front of the credit store and applies the over-limit policy.
//! Purchases on terms call [`CreditLimitGuard::increase_used`] when an
//! order is placed and [`CreditLimitGuard::decrease_used`] when the
//! invoice is settled.

use std::sync::Arc;

use core_kernel::{AccountId, DunningEventId, Money};
use tracing::{info, warn};

use crate::dunning::CreditDunningEvent;
use crate::error::CreditError;
use crate::limit::CreditLimit;
use crate::ports::CreditStore;

/// What happens when an increase would push the balance over the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverLimitPolicy {
    /// Accept the increase and record a dunning event for collections
    #[default]
    AllowAndFlag,
    /// Refuse the increase; nothing is written
    HardBlock,
}

/// Enforces credit limits with a pluggable over-limit policy
#[derive(Clone)]
pub struct CreditLimitGuard {
    store: Arc<dyn CreditStore>,
    policy: OverLimitPolicy,
}

impl CreditLimitGuard {
    pub fn new(store: Arc<dyn CreditStore>, policy: OverLimitPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns true if the account's active line can absorb `amount`
    ///
    /// Accounts without a credit line have no terms-based purchasing and
    /// never have available credit.
    pub async fn has_available_credit(
        &self,
        account_id: AccountId,
        amount: &Money,
    ) -> Result<bool, CreditError> {
        Self::require_positive(amount)?;

        Ok(self
            .store
            .get(account_id)
            .await?
            .map(|limit| limit.covers(amount))
            .unwrap_or(false))
    }

    /// Increases the account's used balance for a purchase on terms
    ///
    /// Under [`OverLimitPolicy::AllowAndFlag`] the increase always lands;
    /// if it pushed the balance over the limit a dunning event is recorded
    /// afterwards. Under [`OverLimitPolicy::HardBlock`] the increase is
    /// conditional at the store and refused with `LimitExceeded` when it
    /// would overshoot: the balance stays untouched but the refused
    /// attempt is still recorded as a dunning event.
    pub async fn increase_used(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, CreditError> {
        Self::require_positive(&amount)?;

        let limit = self.store.get(account_id).await?.ok_or_else(|| {
            CreditError::not_found(format!("No credit line for account {}", account_id))
        })?;
        if !limit.is_active {
            return Err(CreditError::validation(format!(
                "Credit line for account {} is inactive",
                account_id
            )));
        }

        match self.policy {
            OverLimitPolicy::HardBlock => {
                match self
                    .store
                    .try_increase_within_limit(account_id, amount)
                    .await?
                {
                    Some(updated) => Ok(updated),
                    None => {
                        // Re-read for the error report; the balance was
                        // not modified.
                        let current = self.store.get(account_id).await?.unwrap_or(limit);
                        let over = amount.checked_sub(&current.available())?;

                        warn!(
                            account_id = %account_id,
                            over = %over,
                            requested = %amount,
                            available = %current.available(),
                            "Refused over-limit increase, recording dunning event"
                        );
                        // Collections still hears about the attempt even
                        // though the balance stayed untouched.
                        self.store
                            .record_event(CreditDunningEvent::record(current.id, account_id, over))
                            .await?;

                        Err(CreditError::LimitExceeded {
                            available: current.available(),
                            requested: amount,
                        })
                    }
                }
            }
            OverLimitPolicy::AllowAndFlag => {
                let updated = self.store.increase(account_id, amount).await?;

                if let Some(over) = updated.overage() {
                    warn!(
                        account_id = %account_id,
                        over = %over,
                        balance = %updated.current_balance,
                        limit = %updated.approved_limit,
                        "Account exceeded its credit limit, recording dunning event"
                    );
                    self.store
                        .record_event(CreditDunningEvent::record(updated.id, account_id, over))
                        .await?;
                }

                Ok(updated)
            }
        }
    }

    /// Decreases the account's used balance when an invoice settles
    ///
    /// A settlement larger than the outstanding balance clamps at zero
    /// rather than going negative.
    pub async fn decrease_used(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CreditLimit, CreditError> {
        Self::require_positive(&amount)?;

        let limit = self.store.decrease(account_id, amount).await?;

        info!(
            account_id = %account_id,
            amount = %amount,
            balance = %limit.current_balance,
            "Credit balance decreased"
        );

        Ok(limit)
    }

    /// Fetches the account's credit line
    pub async fn credit_line(&self, account_id: AccountId) -> Result<CreditLimit, CreditError> {
        self.store.get(account_id).await?.ok_or_else(|| {
            CreditError::not_found(format!("No credit line for account {}", account_id))
        })
    }

    /// Returns the account's unresolved dunning events, oldest first
    pub async fn active_dunning_events(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<CreditDunningEvent>, CreditError> {
        Ok(self.store.active_events(account_id).await?)
    }

    /// Resolves a dunning event; replaying the resolution is a no-op
    pub async fn resolve_event(
        &self,
        event_id: DunningEventId,
        resolved_by: &str,
        notes: Option<String>,
    ) -> Result<CreditDunningEvent, CreditError> {
        let mut event = self.store.get_event(event_id).await?.ok_or_else(|| {
            CreditError::not_found(format!("Dunning event {} not found", event_id))
        })?;

        event.resolve(resolved_by, notes);
        self.store.update_event(&event).await?;

        info!(
            event_id = %event.id,
            account_id = %event.account_id,
            "Dunning event resolved"
        );

        Ok(event)
    }

    fn require_positive(amount: &Money) -> Result<(), CreditError> {
        if !amount.is_positive() {
            return Err(CreditError::validation(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }
        Ok(())
    }
}
