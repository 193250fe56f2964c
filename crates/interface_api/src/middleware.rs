//! Request middleware: bearer-token authentication and audit logging.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::auth::{validate_token, Claims};
use crate::AppState;

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejects requests without a valid bearer token; on success the decoded
/// [`Claims`] are stored in the request extensions for handlers to read.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = bearer_token(&request) else {
        warn!("Missing or malformed Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = validate_token(token, &state.config.jwt_secret).map_err(|error| {
        warn!(?error, "Token validation failed");
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Logs every request and records successful mutating requests through
/// the audit port. Runs inside the auth layer, so the claims extension
/// is present for authenticated routes.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let actor = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();

    info!(
        method = %method,
        path = %path,
        actor = %actor,
        status = status.as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "API request"
    );

    // Reads are covered by the request log; only mutations hit the audit trail.
    if method != Method::GET && status.is_success() {
        if let Err(error) = state
            .audit
            .log_action(&actor, "http_request", &path, method.as_str())
            .await
        {
            warn!(%error, "Audit log write failed");
        }
    }

    response
}
