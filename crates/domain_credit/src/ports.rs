//! Storage port for the credit domain
//!
//! Balance adjustments are atomic at the store: concurrent increases are
//! serialized, and decreases clamp at zero inside the same statement that
//! applies them.

use async_trait::async_trait;
use core_kernel::{AccountId, DomainPort, DunningEventId, Money, PortError};

use crate::dunning::CreditDunningEvent;
use crate::limit::CreditLimit;

/// Credit limit and dunning event storage
#[async_trait]
pub trait CreditStore: DomainPort {
    /// Fetches the account's active credit line
    async fn get(&self, account_id: AccountId) -> Result<Option<CreditLimit>, PortError>;

    /// Opens a credit line for an account
    ///
    /// # Errors
    ///
    /// Returns `PortError::Conflict` if the account already has an active
    /// line in the same currency.
    async fn open(&self, limit: CreditLimit) -> Result<(), PortError>;

    /// Atomically adds `amount` to the used balance and returns the
    /// updated line, regardless of the limit
    async fn increase(&self, account_id: AccountId, amount: Money)
        -> Result<CreditLimit, PortError>;

    /// Atomically adds `amount` only if it stays within the approved limit
    ///
    /// Returns `None` without writing when the increase would exceed the
    /// limit. Concurrent callers are serialized, so two increases can
    /// never both squeeze into the same headroom.
    async fn try_increase_within_limit(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<Option<CreditLimit>, PortError>;

    /// Atomically subtracts `amount` from the used balance, clamping at
    /// zero, and returns the updated line
    async fn decrease(&self, account_id: AccountId, amount: Money)
        -> Result<CreditLimit, PortError>;

    /// Appends a dunning event
    async fn record_event(&self, event: CreditDunningEvent) -> Result<(), PortError>;

    /// Returns the account's unresolved dunning events, oldest first
    async fn active_events(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<CreditDunningEvent>, PortError>;

    async fn get_event(
        &self,
        event_id: DunningEventId,
    ) -> Result<Option<CreditDunningEvent>, PortError>;

    /// Persists an event's resolution state
    async fn update_event(&self, event: &CreditDunningEvent) -> Result<(), PortError>;
}
