//! Bearer-token authentication middleware.

use crate::errors::RelayError;
use crate::routes::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::IntoResponse;
use std::sync::Arc;

/// Validates the `Authorization: Bearer` header and stores the verified
/// claims in request extensions for handlers to read.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, RelayError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "relay.middleware.auth", "Missing Authorization header");
            RelayError::Unauthorized
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "relay.middleware.auth", "Malformed Authorization header");
        RelayError::Unauthorized
    })?;

    let claims = state.verifier.verify_access_token(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
