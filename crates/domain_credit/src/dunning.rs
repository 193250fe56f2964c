//! Dunning events
//!
//! A dunning event is the collections-team record left behind when an
//! account exceeds its approved limit under the allow-and-flag policy.
//! Events are resolved manually; resolving twice is a no-op so concurrent
//! or replayed resolutions stay safe.

use chrono::{DateTime, Utc};
use core_kernel::{AccountId, CreditLimitId, DunningEventId, Money};
use serde::{Deserialize, Serialize};

/// An over-limit incident awaiting (or having received) resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditDunningEvent {
    /// Unique identifier
    pub id: DunningEventId,
    /// Credit line that was exceeded
    pub credit_limit_id: CreditLimitId,
    /// Account that exceeded it
    pub account_id: AccountId,
    /// Amount the balance stood over the limit when the event fired
    pub amount_over: Money,
    /// When the limit was exceeded
    pub occurred_at: DateTime<Utc>,
    /// Whether the incident has been handled
    pub resolved: bool,
    /// Who resolved it
    pub resolved_by: Option<String>,
    /// When it was resolved
    pub resolved_at: Option<DateTime<Utc>>,
    /// Free-text resolution context
    pub resolution_notes: Option<String>,
}

impl CreditDunningEvent {
    /// Records a fresh, unresolved event
    pub fn record(
        credit_limit_id: CreditLimitId,
        account_id: AccountId,
        amount_over: Money,
    ) -> Self {
        Self {
            id: DunningEventId::new_v7(),
            credit_limit_id,
            account_id,
            amount_over,
            occurred_at: Utc::now(),
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
        }
    }

    /// Marks the event resolved; idempotent
    ///
    /// The first resolution wins: a repeated call leaves the original
    /// resolver, timestamp, and notes untouched.
    pub fn resolve(&mut self, resolved_by: impl Into<String>, notes: Option<String>) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        self.resolved_by = Some(resolved_by.into());
        self.resolved_at = Some(Utc::now());
        self.resolution_notes = notes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn event() -> CreditDunningEvent {
        CreditDunningEvent::record(
            CreditLimitId::new(),
            AccountId::new(),
            Money::new(dec!(150.00), Currency::EUR),
        )
    }

    #[test]
    fn test_new_event_is_unresolved() {
        let e = event();
        assert!(!e.resolved);
        assert!(e.resolved_by.is_none());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut e = event();
        e.resolve("ops@marketplace", Some("Paid via bank transfer".to_string()));
        let first_at = e.resolved_at;

        e.resolve("someone-else", Some("Duplicate".to_string()));

        assert!(e.resolved);
        assert_eq!(e.resolved_by.as_deref(), Some("ops@marketplace"));
        assert_eq!(e.resolved_at, first_at);
        assert_eq!(
            e.resolution_notes.as_deref(),
            Some("Paid via bank transfer")
        );
    }
}
