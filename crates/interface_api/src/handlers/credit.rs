//! Credit limit handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use core_kernel::{AccountId, DunningEventId, Money};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::dto::credit::{
    AdjustCreditRequest, AvailableCreditResponse, CreditLimitResponse, DunningEventResponse,
    ResolveDunningRequest,
};
use crate::dto::parse_currency;
use crate::{error::ApiError, AppState};

/// Fetches an account's credit line
pub async fn get_limit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<CreditLimitResponse>, ApiError> {
    let limit = state
        .credit
        .credit_line(AccountId::from_uuid(account_id))
        .await?;
    Ok(Json(limit.into()))
}

/// Returns how much of the account's credit line is still available
pub async fn get_available(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AvailableCreditResponse>, ApiError> {
    let limit = state
        .credit
        .credit_line(AccountId::from_uuid(account_id))
        .await?;

    let available = limit.available();
    Ok(Json(AvailableCreditResponse {
        account_id,
        available: available.amount(),
        currency: available.currency().code().to_string(),
    }))
}

/// Increases the account's used balance for a purchase on terms
pub async fn increase_used(
    State(state): State<AppState>,
    Json(request): Json<AdjustCreditRequest>,
) -> Result<Json<CreditLimitResponse>, ApiError> {
    let currency = parse_currency(&request.currency)?;
    let limit = state
        .credit
        .increase_used(
            AccountId::from_uuid(request.account_id),
            Money::new(request.amount, currency),
        )
        .await?;
    Ok(Json(limit.into()))
}

/// Decreases the account's used balance when an invoice settles
pub async fn decrease_used(
    State(state): State<AppState>,
    Json(request): Json<AdjustCreditRequest>,
) -> Result<Json<CreditLimitResponse>, ApiError> {
    let currency = parse_currency(&request.currency)?;
    let limit = state
        .credit
        .decrease_used(
            AccountId::from_uuid(request.account_id),
            Money::new(request.amount, currency),
        )
        .await?;
    Ok(Json(limit.into()))
}

/// Lists the account's unresolved dunning events, oldest first
pub async fn list_dunning(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<DunningEventResponse>>, ApiError> {
    let events = state
        .credit
        .active_dunning_events(AccountId::from_uuid(account_id))
        .await?;
    Ok(Json(events.into_iter().map(DunningEventResponse::from).collect()))
}

/// Resolves a dunning event, attributed to the authenticated user
pub async fn resolve_dunning(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<ResolveDunningRequest>,
) -> Result<Json<DunningEventResponse>, ApiError> {
    request.validate()?;

    let event = state
        .credit
        .resolve_event(
            DunningEventId::from_uuid(event_id),
            &claims.sub,
            request.notes,
        )
        .await?;
    Ok(Json(event.into()))
}
