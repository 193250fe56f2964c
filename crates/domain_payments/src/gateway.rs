//! Payment gateway port and sandbox adapter
//!
//! The gateway is an external collaborator: the processor only depends on
//! the [`GatewayAdapter`] trait. The sandbox adapter simulates a real
//! gateway with configurable latency and failure rate, seeded so tests are
//! deterministic, and remembers its decisions so `verify` reconciles to the
//! same outcome the original dispatch produced.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use core_kernel::{DomainPort, PortError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::payment::Payment;

/// The gateway's decision for one operation
#[derive(Debug, Clone)]
pub struct GatewayResult {
    /// Whether the gateway approved the operation
    pub approved: bool,
    /// Gateway-side transaction reference, when one was issued
    pub reference: Option<String>,
    /// Decline or status message
    pub message: Option<String>,
}

impl GatewayResult {
    pub fn approved(reference: impl Into<String>) -> Self {
        Self {
            approved: true,
            reference: Some(reference.into()),
            message: None,
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            approved: false,
            reference: None,
            message: Some(message.into()),
        }
    }
}

/// External payment gateway operations
///
/// Implementations may be slow or unavailable; the processor bounds every
/// call with a timeout and reconciles unknown outcomes via `verify_payment`.
#[async_trait]
pub trait GatewayAdapter: DomainPort {
    /// Charges the payment amount
    async fn process_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError>;

    /// Returns the gateway's authoritative outcome for a payment
    async fn verify_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError>;

    /// Reverses a completed payment
    async fn refund_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError>;

    /// Abandons a payment that has not completed
    async fn cancel_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError>;
}

/// Simulated gateway for development and tests
///
/// Declines a configurable fraction of charges, waits a configurable
/// latency before answering, and records every decision by payment id so
/// later `verify_payment` calls agree with the original dispatch.
pub struct SandboxGateway {
    failure_rate: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
    decisions: Mutex<HashMap<String, GatewayResult>>,
}

impl SandboxGateway {
    /// Default decline fraction
    pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

    pub fn new(failure_rate: f64, latency: Duration, seed: u64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            decisions: Mutex::new(HashMap::new()),
        }
    }

    /// A sandbox that approves everything instantly
    pub fn always_approving() -> Self {
        Self::new(0.0, Duration::ZERO, 0)
    }

    /// A sandbox that declines everything instantly
    pub fn always_declining() -> Self {
        Self::new(1.0, Duration::ZERO, 0)
    }

    fn draw(&self) -> f64 {
        self.rng.lock().expect("sandbox rng poisoned").random::<f64>()
    }

    fn remember(&self, payment: &Payment, result: &GatewayResult) {
        self.decisions
            .lock()
            .expect("sandbox decisions poisoned")
            .insert(payment.id.to_string(), result.clone());
    }

    fn recall(&self, payment: &Payment) -> Option<GatewayResult> {
        self.decisions
            .lock()
            .expect("sandbox decisions poisoned")
            .get(&payment.id.to_string())
            .cloned()
    }
}

impl DomainPort for SandboxGateway {}

#[async_trait]
impl GatewayAdapter for SandboxGateway {
    async fn process_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError> {
        tokio::time::sleep(self.latency).await;

        let result = if self.draw() < self.failure_rate {
            GatewayResult::declined("Card declined by issuer")
        } else {
            GatewayResult::approved(format!("SBX-{}", Uuid::new_v4().simple()))
        };

        debug!(
            payment_id = %payment.id,
            approved = result.approved,
            "Sandbox gateway processed payment"
        );

        self.remember(payment, &result);
        Ok(result)
    }

    async fn verify_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError> {
        tokio::time::sleep(self.latency).await;

        // An unknown payment never reached the gateway, so its charge
        // definitively did not happen.
        Ok(self
            .recall(payment)
            .unwrap_or_else(|| GatewayResult::declined("No such transaction")))
    }

    async fn refund_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError> {
        tokio::time::sleep(self.latency).await;

        match self.recall(payment) {
            Some(original) if original.approved => {
                Ok(GatewayResult::approved(format!(
                    "SBX-RF-{}",
                    Uuid::new_v4().simple()
                )))
            }
            _ => Ok(GatewayResult::declined("Nothing to refund")),
        }
    }

    async fn cancel_payment(&self, payment: &Payment) -> Result<GatewayResult, PortError> {
        tokio::time::sleep(self.latency).await;

        debug!(payment_id = %payment.id, "Sandbox gateway cancelled payment");
        Ok(GatewayResult::approved(format!(
            "SBX-CX-{}",
            Uuid::new_v4().simple()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;
    use core_kernel::{Currency, Money, OrderId};
    use rust_decimal_macros::dec;

    fn payment() -> Payment {
        Payment::claim(
            OrderId::new(),
            "key-1",
            PaymentMethod::Card,
            Money::new(dec!(50.00), Currency::EUR),
        )
    }

    #[tokio::test]
    async fn test_always_approving_approves() {
        let gateway = SandboxGateway::always_approving();
        let result = gateway.process_payment(&payment()).await.unwrap();
        assert!(result.approved);
        assert!(result.reference.unwrap().starts_with("SBX-"));
    }

    #[tokio::test]
    async fn test_always_declining_declines() {
        let gateway = SandboxGateway::always_declining();
        let result = gateway.process_payment(&payment()).await.unwrap();
        assert!(!result.approved);
    }

    #[tokio::test]
    async fn test_verify_agrees_with_original_decision() {
        let gateway = SandboxGateway::always_approving();
        let p = payment();

        let processed = gateway.process_payment(&p).await.unwrap();
        let verified = gateway.verify_payment(&p).await.unwrap();

        assert!(verified.approved);
        assert_eq!(verified.reference, processed.reference);
    }

    #[tokio::test]
    async fn test_verify_unknown_payment_is_declined() {
        let gateway = SandboxGateway::always_approving();
        let result = gateway.verify_payment(&payment()).await.unwrap();
        assert!(!result.approved);
    }

    #[tokio::test]
    async fn test_seeded_runs_are_deterministic() {
        let a = SandboxGateway::new(0.5, Duration::ZERO, 7);
        let b = SandboxGateway::new(0.5, Duration::ZERO, 7);

        for _ in 0..16 {
            let p = payment();
            let ra = a.process_payment(&p).await.unwrap();
            let rb = b.process_payment(&p).await.unwrap();
            assert_eq!(ra.approved, rb.approved);
        }
    }

    #[tokio::test]
    async fn test_refund_requires_an_approved_charge() {
        let gateway = SandboxGateway::always_approving();
        let p = payment();

        let unrefundable = gateway.refund_payment(&p).await.unwrap();
        assert!(!unrefundable.approved);

        gateway.process_payment(&p).await.unwrap();
        let refunded = gateway.refund_payment(&p).await.unwrap();
        assert!(refunded.approved);
    }
}
