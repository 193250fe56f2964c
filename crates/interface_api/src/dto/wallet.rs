//! Wallet DTOs

use chrono::{DateTime, Utc};
use domain_wallet::{TransactionType, Wallet, WalletTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TopUpRequest {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            id: *wallet.id.as_uuid(),
            account_id: *wallet.account_id.as_uuid(),
            balance: wallet.balance.amount(),
            currency: wallet.balance.currency().code().to_string(),
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}

fn type_label(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::TopUp => "TOP_UP",
        TransactionType::Debit => "DEBIT",
        TransactionType::Refund => "REFUND",
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub transaction_type: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransaction> for TransactionResponse {
    fn from(entry: WalletTransaction) -> Self {
        Self {
            id: *entry.id.as_uuid(),
            wallet_id: *entry.wallet_id.as_uuid(),
            transaction_type: type_label(entry.transaction_type).to_string(),
            amount: entry.amount.amount(),
            balance_after: entry.balance_after.amount(),
            currency: entry.amount.currency().code().to_string(),
            payment_id: entry.payment_id.map(|id| *id.as_uuid()),
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}
