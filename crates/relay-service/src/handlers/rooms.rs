//! Room provisioning endpoint.
//!
//! Creating a room allocates nothing server-side. The identifier is simply a
//! fresh random name; the room actor comes to life when the first WebSocket
//! joins and disappears when the last one leaves.

use crate::errors::RelayError;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub ws_url: String,
}

/// POST /api/v1/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, RelayError> {
    let room_id = common::ids::random_hex_id();
    let ws_url = websocket_url(state.public_ws_base.as_deref(), &headers, &room_id);

    tracing::info!(target: "relay.http", room_id = %room_id, "Room created");

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse { room_id, ws_url }),
    ))
}

/// Builds the join URL for a room.
///
/// A configured public base wins. Otherwise the URL is derived from the
/// request: `X-Forwarded-Proto: https` upgrades the scheme to `wss` so URLs
/// stay correct behind a TLS-terminating proxy.
fn websocket_url(public_base: Option<&str>, headers: &HeaderMap, room_id: &str) -> String {
    if let Some(base) = public_base {
        return format!("{}/ws/{}", base.trim_end_matches('/'), room_id);
    }

    let host = headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
    {
        Some("https") => "wss",
        _ => "ws",
    };

    format!("{}://{}/ws/{}", scheme, host, room_id)
}
