//! Payment processor
//!
//! Orchestrates the full payment flow: idempotency claim, route dispatch,
//! order transition, and best-effort notification. The claim is the only
//! point that decides whether money may move; once a request loses the
//! claim it returns the winner's payment untouched.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{Notification, NotificationSender, OrderId, PaymentId};
use domain_wallet::{DebitOutcome, TransactionType, WalletLedger};
use tracing::{info, warn};

use crate::error::PaymentError;
use crate::gateway::GatewayAdapter;
use crate::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::ports::{ClaimOutcome, OrderStatus, OrderStore, OrderSummary, PaymentStore};

/// The two ways a payment can be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRoute {
    /// Debit the buyer's prepaid wallet
    Wallet,
    /// Charge through the external gateway
    Gateway,
}

/// Command to process a payment for an order
#[derive(Debug, Clone)]
pub struct ProcessPayment {
    pub order_id: OrderId,
    /// Client-supplied key making the request safe to retry
    pub idempotency_key: String,
    pub method: PaymentMethod,
}

/// Idempotent, routed payment processing
#[derive(Clone)]
pub struct PaymentProcessor {
    payments: Arc<dyn PaymentStore>,
    orders: Arc<dyn OrderStore>,
    ledger: WalletLedger,
    gateway: Arc<dyn GatewayAdapter>,
    notifier: Arc<dyn NotificationSender>,
    gateway_timeout: Duration,
}

impl PaymentProcessor {
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        orders: Arc<dyn OrderStore>,
        ledger: WalletLedger,
        gateway: Arc<dyn GatewayAdapter>,
        notifier: Arc<dyn NotificationSender>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            payments,
            orders,
            ledger,
            gateway,
            notifier,
            gateway_timeout,
        }
    }

    /// Processes a payment for an order, exactly once per idempotency key
    ///
    /// A replayed key returns the earlier payment without moving money or
    /// touching the order, whatever state that payment is in.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order and `InvalidState` when the
    /// order is not awaiting payment. A declined or insufficient-funds
    /// payment is NOT an error: it comes back as a `Failed` payment.
    pub async fn process(&self, cmd: ProcessPayment) -> Result<Payment, PaymentError> {
        let order = self
            .orders
            .get(cmd.order_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(format!("Order {} not found", cmd.order_id)))?;

        if order.status != OrderStatus::Pending {
            return Err(PaymentError::invalid_state(format!(
                "Order {} is {:?}, not awaiting payment",
                order.id, order.status
            )));
        }

        let candidate = Payment::claim(
            order.id,
            cmd.idempotency_key.clone(),
            cmd.method,
            order.total_amount,
        );

        let mut payment = match self.payments.insert_new(candidate).await? {
            ClaimOutcome::Existing(existing) => {
                info!(
                    payment_id = %existing.id,
                    idempotency_key = %cmd.idempotency_key,
                    status = ?existing.status,
                    "Replayed idempotency key, returning original payment"
                );
                return Ok(existing);
            }
            ClaimOutcome::Created(payment) => payment,
        };

        match payment.method.route() {
            PaymentRoute::Wallet => self.execute_wallet(&mut payment, &order).await?,
            PaymentRoute::Gateway => self.execute_gateway(&mut payment).await?,
        }

        Ok(payment)
    }

    /// Reconciles a non-terminal payment along its original route
    ///
    /// Gateway payments are verified against the gateway, whose answer is
    /// authoritative for whether the charge happened. Wallet payments never
    /// reached the gateway, so they are reconciled against the wallet
    /// ledger: the debit entry either landed or no money moved.
    pub async fn verify(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        let mut payment = self.load_payment(payment_id).await?;

        if payment.status.is_terminal() {
            return Ok(payment);
        }

        match payment.method.route() {
            PaymentRoute::Wallet => self.verify_wallet(&mut payment).await?,
            PaymentRoute::Gateway => self.verify_gateway(&mut payment).await?,
        }

        Ok(payment)
    }

    /// Reverses a completed payment along its original route
    ///
    /// Wallet payments are credited back to the wallet; gateway payments
    /// are refunded through the gateway.
    pub async fn refund(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        let mut payment = self.load_payment(payment_id).await?;

        if payment.status != PaymentStatus::Completed {
            return Err(PaymentError::invalid_state(format!(
                "Only completed payments can be refunded, payment {} is {:?}",
                payment.id, payment.status
            )));
        }

        let order = self.orders.get(payment.order_id).await?.ok_or_else(|| {
            PaymentError::not_found(format!("Order {} not found", payment.order_id))
        })?;

        match payment.method.route() {
            PaymentRoute::Wallet => {
                self.ledger
                    .refund(order.buyer_account_id, payment.amount, payment.id)
                    .await?;
            }
            PaymentRoute::Gateway => {
                let result = self.gateway.refund_payment(&payment).await?;
                if !result.approved {
                    return Err(PaymentError::invalid_state(format!(
                        "Gateway refused to refund payment {}: {}",
                        payment.id,
                        result.message.unwrap_or_default()
                    )));
                }
            }
        }

        payment.transition(PaymentStatus::Refunded);
        self.payments.update(&payment).await?;

        info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            "Payment refunded"
        );

        Ok(payment)
    }

    /// Abandons a payment that has not completed
    pub async fn cancel(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        let mut payment = self.load_payment(payment_id).await?;

        if payment.status.is_terminal() {
            return Err(PaymentError::invalid_state(format!(
                "Payment {} is already {:?}",
                payment.id, payment.status
            )));
        }

        if payment.method.route() == PaymentRoute::Gateway {
            if let Err(error) = self.gateway.cancel_payment(&payment).await {
                warn!(payment_id = %payment.id, %error, "Gateway cancel failed");
            }
        }

        payment.transition(PaymentStatus::Cancelled);
        self.payments.update(&payment).await?;

        Ok(payment)
    }

    /// Fetches a payment by id
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        self.load_payment(payment_id).await
    }

    /// Returns all payment attempts for an order, newest first
    pub async fn payments_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.payments.find_by_order(order_id).await?)
    }

    async fn verify_gateway(&self, payment: &mut Payment) -> Result<(), PaymentError> {
        let result = self.gateway.verify_payment(payment).await?;
        payment.record_gateway(result.reference, result.message);

        if result.approved {
            payment.transition(PaymentStatus::Completed);
            self.payments.update(payment).await?;
            self.confirm_order(payment).await?;
        } else {
            payment.transition(PaymentStatus::Failed);
            self.payments.update(payment).await?;
        }

        info!(
            payment_id = %payment.id,
            status = ?payment.status,
            "Reconciled payment against gateway"
        );
        Ok(())
    }

    async fn verify_wallet(&self, payment: &mut Payment) -> Result<(), PaymentError> {
        let order = self.orders.get(payment.order_id).await?.ok_or_else(|| {
            PaymentError::not_found(format!("Order {} not found", payment.order_id))
        })?;

        let wallet = self
            .ledger
            .wallet(order.buyer_account_id, payment.amount.currency())
            .await?;

        let debited = match wallet {
            Some(wallet) => self.ledger.entries(wallet.id).await?.iter().any(|entry| {
                entry.transaction_type == TransactionType::Debit
                    && entry.payment_id == Some(payment.id)
            }),
            None => false,
        };

        if debited {
            payment.transition(PaymentStatus::Completed);
            self.payments.update(payment).await?;
            self.confirm_order(payment).await?;
        } else {
            payment.transition(PaymentStatus::Failed);
            self.payments.update(payment).await?;
        }

        info!(
            payment_id = %payment.id,
            status = ?payment.status,
            "Reconciled wallet payment against the ledger"
        );
        Ok(())
    }

    async fn execute_wallet(
        &self,
        payment: &mut Payment,
        order: &OrderSummary,
    ) -> Result<(), PaymentError> {
        match self
            .ledger
            .debit(order.buyer_account_id, payment.amount, payment.id)
            .await?
        {
            DebitOutcome::Debited(wallet) => {
                payment.transition(PaymentStatus::Completed);
                self.payments.update(payment).await?;
                self.confirm_order(payment).await?;

                info!(
                    payment_id = %payment.id,
                    wallet_id = %wallet.id,
                    amount = %payment.amount,
                    "Wallet payment completed"
                );
            }
            DebitOutcome::InsufficientFunds { balance, requested } => {
                payment.gateway_response = Some(format!(
                    "Insufficient wallet balance: {} available, {} requested",
                    balance, requested
                ));
                payment.transition(PaymentStatus::Failed);
                self.payments.update(payment).await?;

                info!(
                    payment_id = %payment.id,
                    balance = %balance,
                    requested = %requested,
                    "Wallet payment declined for insufficient funds"
                );
            }
        }
        Ok(())
    }

    async fn execute_gateway(&self, payment: &mut Payment) -> Result<(), PaymentError> {
        payment.transition(PaymentStatus::Processing);
        self.payments.update(payment).await?;

        let dispatch = tokio::time::timeout(
            self.gateway_timeout,
            self.gateway.process_payment(payment),
        )
        .await;

        match dispatch {
            Ok(Ok(result)) => {
                payment.record_gateway(result.reference, result.message);
                if result.approved {
                    payment.transition(PaymentStatus::Completed);
                    self.payments.update(payment).await?;
                    self.confirm_order(payment).await?;

                    info!(
                        payment_id = %payment.id,
                        reference = payment.gateway_reference.as_deref().unwrap_or(""),
                        "Gateway payment completed"
                    );
                } else {
                    payment.transition(PaymentStatus::Failed);
                    self.payments.update(payment).await?;

                    info!(
                        payment_id = %payment.id,
                        "Gateway declined payment"
                    );
                }
            }
            Ok(Err(error)) if error.is_transient() => {
                // The charge may or may not have happened; stay in
                // Processing and let verify() reconcile.
                warn!(
                    payment_id = %payment.id,
                    %error,
                    "Gateway dispatch failed transiently, payment awaits verification"
                );
            }
            Ok(Err(error)) => {
                payment.gateway_response = Some(error.to_string());
                payment.transition(PaymentStatus::Failed);
                self.payments.update(payment).await?;

                warn!(payment_id = %payment.id, %error, "Gateway dispatch failed");
            }
            Err(_elapsed) => {
                warn!(
                    payment_id = %payment.id,
                    timeout_ms = self.gateway_timeout.as_millis() as u64,
                    "Gateway dispatch timed out, payment awaits verification"
                );
            }
        }

        Ok(())
    }

    /// Moves the paid order to Placed and notifies the buyer, best-effort
    async fn confirm_order(&self, payment: &Payment) -> Result<(), PaymentError> {
        self.orders
            .set_status(payment.order_id, OrderStatus::Placed)
            .await?;

        let order = self.orders.get(payment.order_id).await?;
        if let Some(order) = order {
            let notification = Notification {
                account_id: order.buyer_account_id.to_string(),
                subject: format!("Order {} confirmed", order.id),
                body: format!(
                    "Your payment of {} was received and order {} has been placed.",
                    payment.amount, order.id
                ),
            };
            if let Err(error) = self.notifier.send(notification).await {
                warn!(
                    payment_id = %payment.id,
                    %error,
                    "Failed to send order confirmation"
                );
            }
        }

        Ok(())
    }

    async fn load_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(format!("Payment {} not found", payment_id)))
    }
}
