//! Route table and shared application state.

use crate::actors::registry::RoomRegistry;
use crate::handlers::{auth, rooms, ws};
use crate::middleware::auth::require_auth;
use axum::routing::{get, post};
use axum::{middleware, Router};
use credential::service::CredentialService;
use credential::signer::AccessVerifier;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
pub struct AppState {
    pub credentials: CredentialService,
    pub verifier: Arc<dyn AccessVerifier>,
    pub registry: RoomRegistry,
    pub public_ws_base: Option<String>,
    /// Root token; each connection runs under a child of it so shutdown
    /// reaches every socket.
    pub cancel_token: CancellationToken,
}

/// Builds the complete router.
pub fn build_routes(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/sessions", get(auth::sessions))
        .route("/api/v1/rooms", post(rooms::create_room))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Account endpoints
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .merge(protected)
        // Room join
        .route("/ws/:room_id", get(ws::join_room))
        // Health check
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
