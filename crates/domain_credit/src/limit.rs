//! Credit limit aggregate

use chrono::{DateTime, Utc};
use core_kernel::{AccountId, CreditLimitId, Currency, Money};
use serde::{Deserialize, Serialize};

/// An account's approved credit line and its current utilization
///
/// `current_balance` is the amount of credit in use. It is adjusted
/// atomically by the store and never goes negative; it MAY exceed
/// `approved_limit` under the allow-and-flag policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLimit {
    /// Unique identifier
    pub id: CreditLimitId,
    /// Account the line belongs to
    pub account_id: AccountId,
    /// Optional cost center the line is scoped to
    pub cost_center_id: Option<String>,
    /// Maximum approved exposure
    pub approved_limit: Money,
    /// Credit currently in use, non-negative
    pub current_balance: Money,
    /// Inactive lines refuse new exposure
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl CreditLimit {
    /// Opens an active, unused credit line
    pub fn open(account_id: AccountId, approved_limit: Money) -> Self {
        let now = Utc::now();
        let currency = approved_limit.currency();
        Self {
            id: CreditLimitId::new_v7(),
            account_id,
            cost_center_id: None,
            approved_limit,
            current_balance: Money::zero(currency),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scopes the line to a cost center
    pub fn with_cost_center(mut self, cost_center_id: impl Into<String>) -> Self {
        self.cost_center_id = Some(cost_center_id.into());
        self
    }

    /// The line's currency
    pub fn currency(&self) -> Currency {
        self.approved_limit.currency()
    }

    /// Headroom left on the line; zero when over limit
    pub fn available(&self) -> Money {
        let diff = self.approved_limit - self.current_balance;
        if diff.is_negative() {
            Money::zero(self.currency())
        } else {
            diff
        }
    }

    /// Amount by which utilization exceeds the approved limit, if any
    pub fn overage(&self) -> Option<Money> {
        let diff = self.current_balance - self.approved_limit;
        diff.is_positive().then_some(diff)
    }

    /// True when the line can absorb `amount` without exceeding the limit
    pub fn covers(&self, amount: &Money) -> bool {
        self.is_active && self.available().amount() >= amount.amount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit(approved: &str, used: &str) -> CreditLimit {
        let mut l = CreditLimit::open(
            AccountId::new(),
            Money::new(approved.parse().unwrap(), Currency::EUR),
        );
        l.current_balance = Money::new(used.parse().unwrap(), Currency::EUR);
        l
    }

    #[test]
    fn test_available_is_headroom() {
        let l = limit("1000.00", "250.00");
        assert_eq!(l.available().amount(), dec!(750.00));
        assert!(l.overage().is_none());
    }

    #[test]
    fn test_available_clamps_at_zero_when_over() {
        let l = limit("1000.00", "1100.00");
        assert!(l.available().is_zero());
        assert_eq!(l.overage().unwrap().amount(), dec!(100.00));
    }

    #[test]
    fn test_covers_exact_headroom() {
        let l = limit("1000.00", "400.00");
        assert!(l.covers(&Money::new(dec!(600.00), Currency::EUR)));
        assert!(!l.covers(&Money::new(dec!(600.01), Currency::EUR)));
    }

    #[test]
    fn test_inactive_line_covers_nothing() {
        let mut l = limit("1000.00", "0.00");
        l.is_active = false;
        assert!(!l.covers(&Money::new(dec!(1.00), Currency::EUR)));
    }
}
