//! Credit domain errors

use core_kernel::{Money, MoneyError, PortError};
use thiserror::Error;

/// Errors produced by the credit domain
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Credit limit exceeded: {available} available, {requested} requested")]
    LimitExceeded { available: Money, requested: Money },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl CreditError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
