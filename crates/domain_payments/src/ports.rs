//! Storage ports for the payments domain

use async_trait::async_trait;
use core_kernel::{AccountId, DomainPort, Money, OrderId, PaymentId, PortError};
use serde::{Deserialize, Serialize};

use crate::payment::Payment;

/// The result of an idempotency claim
///
/// Inserting the payment row with its unique idempotency key either
/// creates the row or surfaces the payment that already owns the key.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// This caller won the claim and must process the payment
    Created(Payment),
    /// Another request already claimed the key; return its payment as-is
    Existing(Payment),
}

/// Payment row storage
#[async_trait]
pub trait PaymentStore: DomainPort {
    /// Claims the payment's idempotency key
    ///
    /// Must be atomic against concurrent claims of the same key: exactly
    /// one caller observes `Created`, every other observes `Existing` with
    /// the winner's row.
    async fn insert_new(&self, payment: Payment) -> Result<ClaimOutcome, PortError>;

    /// Persists the payment's current state
    async fn update(&self, payment: &Payment) -> Result<(), PortError>;

    async fn get(&self, id: PaymentId) -> Result<Option<Payment>, PortError>;

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>, PortError>;

    /// Returns all payment attempts for an order, newest first
    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PortError>;
}

/// Order lifecycle status, as the payments domain sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment
    Pending,
    /// Paid and confirmed
    Placed,
    Cancelled,
}

/// The slice of an order the payment processor needs
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: OrderId,
    /// Account that pays
    pub buyer_account_id: AccountId,
    pub po_number: Option<String>,
    /// Amount a payment against this order must charge
    pub total_amount: Money,
    pub status: OrderStatus,
}

/// Read and transition orders from the payments domain
#[async_trait]
pub trait OrderStore: DomainPort {
    async fn get(&self, id: OrderId) -> Result<Option<OrderSummary>, PortError>;

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), PortError>;
}
