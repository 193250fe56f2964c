//! Wallet handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use core_kernel::{AccountId, Money, WalletId};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::parse_currency;
use crate::dto::wallet::{TopUpRequest, TransactionResponse, WalletResponse};
use crate::{error::ApiError, AppState};

/// Currency selector for wallet lookups; wallets are per (account, currency)
#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    pub currency: Option<String>,
}

impl WalletQuery {
    fn currency(&self) -> Result<core_kernel::Currency, ApiError> {
        parse_currency(self.currency.as_deref().unwrap_or("USD"))
    }
}

/// Fetches an account's wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<WalletResponse>, ApiError> {
    let currency = query.currency()?;
    let account_id = AccountId::from_uuid(account_id);

    let wallet = state
        .ledger
        .wallet(account_id, currency)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No {} wallet for account {}", currency, account_id))
        })?;

    Ok(Json(wallet.into()))
}

/// Adds funds to an account's wallet, creating the wallet when absent
pub async fn top_up(
    State(state): State<AppState>,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    request.validate()?;

    let currency = parse_currency(&request.currency)?;
    let wallet = state
        .ledger
        .top_up(
            AccountId::from_uuid(request.account_id),
            Money::new(request.amount, currency),
            request.description,
        )
        .await?;

    Ok(Json(wallet.into()))
}

/// Lists a wallet's ledger entries, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let entries = state
        .ledger
        .entries(WalletId::from_uuid(wallet_id))
        .await?;

    Ok(Json(entries.into_iter().map(TransactionResponse::from).collect()))
}
