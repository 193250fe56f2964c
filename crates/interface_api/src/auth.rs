//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bearer-token claims carried through request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the acting user)
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Issues a signed token for `user_id`, valid for `expiration_secs`.
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let issued = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: (issued + Duration::seconds(expiration_secs as i64)).timestamp(),
        iat: issued.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Decodes and verifies a token, distinguishing expiry from everything else.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// `admin` implies every role.
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Permission definitions
pub mod permissions {
    pub const INVOICE_READ: &str = "invoice:read";
    pub const INVOICE_WRITE: &str = "invoice:write";
    pub const INVOICE_ISSUE: &str = "invoice:issue";
    pub const WALLET_READ: &str = "wallet:read";
    pub const WALLET_WRITE: &str = "wallet:write";
    pub const CREDIT_READ: &str = "credit:read";
    pub const CREDIT_WRITE: &str = "credit:write";
    pub const CREDIT_RESOLVE: &str = "credit:resolve";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = create_token(
            "user-1",
            vec!["finance".to_string()],
            "test-secret",
            600,
        )
        .unwrap();
        let claims = validate_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(has_role(&claims, "finance"));
        assert!(!has_role(&claims, "collections"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("user-1", vec![], "test-secret", 600).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_admin_has_every_role() {
        let token = create_token("root", vec!["admin".to_string()], "test-secret", 600).unwrap();
        let claims = validate_token(&token, "test-secret").unwrap();
        assert!(has_role(&claims, permissions::CREDIT_RESOLVE));
    }
}
