//! Account and session endpoints.

use crate::errors::RelayError;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use common::secret::{ExposeSecret, SecretString};
use credential::service::IssuedCredentials;
use credential::signer::AccessClaims;
use credential::store::RenewalCredential;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: SecretString,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

impl From<IssuedCredentials> for AuthResponse {
    fn from(issued: IssuedCredentials) -> Self {
        AuthResponse {
            user: UserSummary {
                id: issued.user.id,
                username: issued.user.username,
            },
            access_token: issued.access_token,
            refresh_token: issued.renewal_secret,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RenewalCredential> for SessionSummary {
    fn from(record: RenewalCredential) -> Self {
        SessionSummary {
            id: record.id,
            device_id: record.device_id,
            expires_at: record.expires_at,
            updated_at: record.updated_at,
        }
    }
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let issued = state
        .credentials
        .register(
            &req.username,
            req.password.expose_secret(),
            req.device_id.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(issued))))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, RelayError> {
    let issued = state
        .credentials
        .login(
            &req.username,
            req.password.expose_secret(),
            req.device_id.as_deref(),
        )
        .await?;

    Ok(Json(AuthResponse::from(issued)))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, RelayError> {
    let issued = state
        .credentials
        .rotate(req.refresh_token.expose_secret(), req.device_id.as_deref())
        .await?;

    Ok(Json(AuthResponse::from(issued)))
}

/// GET /api/v1/auth/sessions
pub async fn sessions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<Vec<SessionSummary>>, RelayError> {
    let sessions = state.credentials.list_active_sessions(claims.user_id).await?;

    Ok(Json(
        sessions.into_iter().map(SessionSummary::from).collect(),
    ))
}
