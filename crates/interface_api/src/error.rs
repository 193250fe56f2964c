//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_kernel::PortError;
use domain_credit::CreditError;
use domain_invoicing::InvoicingError;
use domain_wallet::WalletError;
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { .. } => ApiError::Validation(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<InvoicingError> for ApiError {
    fn from(err: InvoicingError) -> Self {
        match err {
            InvoicingError::NotFound(msg) => ApiError::NotFound(msg),
            InvoicingError::InvalidState(msg) => ApiError::Conflict(msg),
            InvoicingError::Validation(msg) => ApiError::Validation(msg),
            InvoicingError::Money(inner) => ApiError::BadRequest(inner.to_string()),
            InvoicingError::Port(inner) => inner.into(),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotFound(msg) => ApiError::NotFound(msg),
            WalletError::Validation(msg) => ApiError::Validation(msg),
            WalletError::Money(inner) => ApiError::BadRequest(inner.to_string()),
            WalletError::Port(inner) => inner.into(),
        }
    }
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::NotFound(msg) => ApiError::NotFound(msg),
            limit @ CreditError::LimitExceeded { .. } => ApiError::Conflict(limit.to_string()),
            CreditError::Validation(msg) => ApiError::Validation(msg),
            CreditError::Money(inner) => ApiError::BadRequest(inner.to_string()),
            CreditError::Port(inner) => inner.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = InvoicingError::not_found("Document DOC-1 not found").into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_invalid_state_maps_to_conflict() {
        let err: ApiError = InvoicingError::invalid_state("already issued").into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_limit_exceeded_maps_to_conflict() {
        let err: ApiError = CreditError::LimitExceeded {
            available: Money::new(dec!(100), Currency::USD),
            requested: Money::new(dec!(500), Currency::USD),
        }
        .into();
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("exceeded")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_transient_port_error_maps_to_internal() {
        let err: ApiError = PortError::connection("database unreachable").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
