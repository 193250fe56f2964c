//! Credit limit DTOs

use chrono::{DateTime, Utc};
use domain_credit::{CreditDunningEvent, CreditLimit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct AdjustCreditRequest {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CreditLimitResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center_id: Option<String>,
    pub approved_limit: Decimal,
    pub current_balance: Decimal,
    pub available: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CreditLimit> for CreditLimitResponse {
    fn from(limit: CreditLimit) -> Self {
        let available = limit.available();
        Self {
            id: *limit.id.as_uuid(),
            account_id: *limit.account_id.as_uuid(),
            cost_center_id: limit.cost_center_id,
            approved_limit: limit.approved_limit.amount(),
            current_balance: limit.current_balance.amount(),
            available: available.amount(),
            currency: available.currency().code().to_string(),
            is_active: limit.is_active,
            created_at: limit.created_at,
            updated_at: limit.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailableCreditResponse {
    pub account_id: Uuid,
    pub available: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct DunningEventResponse {
    pub id: Uuid,
    pub credit_limit_id: Uuid,
    pub account_id: Uuid,
    pub amount_over: Decimal,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

impl From<CreditDunningEvent> for DunningEventResponse {
    fn from(event: CreditDunningEvent) -> Self {
        Self {
            id: *event.id.as_uuid(),
            credit_limit_id: *event.credit_limit_id.as_uuid(),
            account_id: *event.account_id.as_uuid(),
            amount_over: event.amount_over.amount(),
            currency: event.amount_over.currency().code().to_string(),
            occurred_at: event.occurred_at,
            resolved: event.resolved,
            resolved_by: event.resolved_by,
            resolved_at: event.resolved_at,
            resolution_notes: event.resolution_notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveDunningRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
