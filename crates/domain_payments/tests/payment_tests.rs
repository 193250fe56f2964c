//! Payments domain tests for the entity layer and the sandbox gateway;
//! processor flows against stores are covered by the workspace
//! integration tests.

use core_kernel::{Currency, Money, OrderId};
use domain_payments::{
    GatewayAdapter, GatewayResult, Payment, PaymentMethod, PaymentRoute, PaymentStatus,
    SandboxGateway,
};
use rust_decimal_macros::dec;

fn claim(method: PaymentMethod) -> Payment {
    Payment::claim(
        OrderId::new(),
        "idem-key-1",
        method,
        Money::new(dec!(250.00), Currency::EUR),
    )
}

#[test]
fn test_wallet_method_routes_to_wallet() {
    assert_eq!(PaymentMethod::Wallet.route(), PaymentRoute::Wallet);
}

#[test]
fn test_external_methods_route_to_gateway() {
    assert_eq!(PaymentMethod::Card.route(), PaymentRoute::Gateway);
    assert_eq!(PaymentMethod::BankTransfer.route(), PaymentRoute::Gateway);
}

#[test]
fn test_claim_carries_key_and_amount() {
    let payment = claim(PaymentMethod::Wallet);
    assert_eq!(payment.idempotency_key, "idem-key-1");
    assert_eq!(payment.amount.amount(), dec!(250.00));
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[test]
fn test_record_gateway_keeps_reference_on_later_messages() {
    let mut payment = claim(PaymentMethod::Card);

    payment.record_gateway(Some("SBX-abc".to_string()), None);
    payment.record_gateway(None, Some("settled".to_string()));

    assert_eq!(payment.gateway_reference.as_deref(), Some("SBX-abc"));
    assert_eq!(payment.gateway_response.as_deref(), Some("settled"));
}

#[test]
fn test_gateway_result_constructors() {
    let ok = GatewayResult::approved("SBX-1");
    assert!(ok.approved);
    assert_eq!(ok.reference.as_deref(), Some("SBX-1"));

    let declined = GatewayResult::declined("expired card");
    assert!(!declined.approved);
    assert_eq!(declined.message.as_deref(), Some("expired card"));
}

#[tokio::test]
async fn test_sandbox_failure_rate_boundaries() {
    let approving = SandboxGateway::always_approving();
    let declining = SandboxGateway::always_declining();
    let payment = claim(PaymentMethod::Card);

    assert!(approving.process_payment(&payment).await.unwrap().approved);
    assert!(!declining.process_payment(&payment).await.unwrap().approved);
}
