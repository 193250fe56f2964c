//! Payment aggregate

use chrono::{DateTime, Utc};
use core_kernel::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

use crate::processor::PaymentRoute;

/// How the buyer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Prepaid wallet balance
    Wallet,
    /// Card via the external gateway
    Card,
    /// Bank transfer via the external gateway
    BankTransfer,
}

impl PaymentMethod {
    /// The processing route this method dispatches to
    pub fn route(&self) -> PaymentRoute {
        match self {
            PaymentMethod::Wallet => PaymentRoute::Wallet,
            PaymentMethod::Card | PaymentMethod::BankTransfer => PaymentRoute::Gateway,
        }
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Claimed but not yet dispatched
    Pending,
    /// Dispatched to the gateway, outcome unknown
    Processing,
    /// Funds moved
    Completed,
    /// Declined or insufficient funds; no funds moved
    Failed,
    /// Abandoned before completion
    Cancelled,
    /// Completed, then reversed
    Refunded,
}

impl PaymentStatus {
    /// Terminal statuses never transition again, except `Completed`
    /// which may still become `Refunded`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Cancelled
                | PaymentStatus::Refunded
        )
    }
}

/// A payment attempt against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Order being paid
    pub order_id: OrderId,
    /// Client-supplied key; at most one payment row exists per key
    pub idempotency_key: String,
    /// Payment method, fixed at creation
    pub method: PaymentMethod,
    /// Gateway transaction reference, once known
    pub gateway_reference: Option<String>,
    /// Amount, equal to the order total at claim time
    pub amount: Money,
    /// Lifecycle status
    pub status: PaymentStatus,
    /// Last gateway or decline message, for diagnostics
    pub gateway_response: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment claim
    pub fn claim(
        order_id: OrderId,
        idempotency_key: impl Into<String>,
        method: PaymentMethod,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            order_id,
            idempotency_key: idempotency_key.into(),
            method,
            gateway_reference: None,
            amount,
            status: PaymentStatus::Pending,
            gateway_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the payment to a new status
    pub fn transition(&mut self, status: PaymentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Records the gateway's reference and message
    pub fn record_gateway(&mut self, reference: Option<String>, message: Option<String>) {
        if reference.is_some() {
            self.gateway_reference = reference;
        }
        self.gateway_response = message;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_method_routing() {
        assert_eq!(PaymentMethod::Wallet.route(), PaymentRoute::Wallet);
        assert_eq!(PaymentMethod::Card.route(), PaymentRoute::Gateway);
        assert_eq!(PaymentMethod::BankTransfer.route(), PaymentRoute::Gateway);
    }

    #[test]
    fn test_claim_starts_pending() {
        let payment = Payment::claim(
            OrderId::new(),
            "key-1",
            PaymentMethod::Card,
            Money::new(dec!(100.00), Currency::EUR),
        );
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.gateway_reference.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::Processing.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Refunded.is_terminal());
    }
}
