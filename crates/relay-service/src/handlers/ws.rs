//! WebSocket join endpoint.

use crate::actors::connection::Connection;
use crate::routes::AppState;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use credential::signer::AccessVerifier;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /ws/:room_id
///
/// The token is optional. A valid one pins the connection's identity to the
/// account username; anything else joins anonymously under a random
/// identity. Join failures after the upgrade simply close the socket, since
/// there is no HTTP response left to carry an error.
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<JoinQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, room_id, query.token, socket))
}

async fn handle_socket(
    state: Arc<AppState>,
    room_id: String,
    token: Option<String>,
    socket: WebSocket,
) {
    let identity = resolve_identity(state.verifier.as_ref(), token.as_deref());
    let cancel_token = state.cancel_token.child_token();

    match Connection::join(&state.registry, &room_id, identity, cancel_token).await {
        Ok(connection) => connection.run(socket).await,
        Err(e) => {
            tracing::warn!(
                target: "relay.ws",
                room_id = %room_id,
                error = %e,
                "Could not place connection in room, closing socket"
            );
        }
    }
}

/// Maps an optional access token to a connection identity.
///
/// Verified tokens yield the account username. Missing or invalid tokens
/// fall back to a fresh anonymous identity rather than rejecting the join.
fn resolve_identity(verifier: &dyn AccessVerifier, token: Option<&str>) -> String {
    if let Some(token) = token {
        if let Ok(claims) = verifier.verify_access_token(token) {
            if !claims.username.is_empty() {
                return claims.username;
            }
        }
    }
    common::ids::random_hex_id()
}
