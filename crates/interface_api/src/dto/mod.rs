//! Request/response data transfer objects

pub mod credit;
pub mod invoicing;
pub mod wallet;

use core_kernel::Currency;

use crate::error::ApiError;

/// Parses an ISO currency code from a request body or query string
pub(crate) fn parse_currency(code: &str) -> Result<Currency, ApiError> {
    Currency::from_code(code)
        .map_err(|_| ApiError::BadRequest(format!("Unknown currency '{}'", code)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("EUR").unwrap(), Currency::EUR);
        assert!(matches!(
            parse_currency("XAU"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
