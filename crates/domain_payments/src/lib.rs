//! Payments Domain - Idempotent Payment Processing
//!
//! Payments against marketplace orders are processed exactly once per
//! idempotency key and routed by payment method:
//!
//! - **Wallet**: an atomic conditional debit against the buyer's prepaid
//!   wallet. Insufficient funds fails the payment without touching the
//!   order.
//! - **Gateway**: dispatch to an external payment gateway behind the
//!   [`GatewayAdapter`] port, bounded by a timeout. A timed-out dispatch
//!   leaves the payment in `Processing` until [`PaymentProcessor::verify`]
//!   reconciles it against the gateway.
//!
//! The idempotency claim is storage-backed: inserting the payment row with
//! its unique key either creates it or surfaces the earlier payment, so a
//! replayed request returns the original outcome and moves no money twice.

pub mod payment;
pub mod gateway;
pub mod processor;
pub mod ports;
pub mod error;

pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use gateway::{GatewayAdapter, GatewayResult, SandboxGateway};
pub use processor::{PaymentProcessor, PaymentRoute, ProcessPayment};
pub use ports::{ClaimOutcome, OrderStatus, OrderStore, OrderSummary, PaymentStore};
pub use error::PaymentError;
