//! Service error types and their HTTP representation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credential::errors::CredentialError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the relay's HTTP and WebSocket layers.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing or invalid authorization")]
    Unauthorized,

    #[error("Room is no longer available")]
    RoomClosed,

    #[error("Failed to join room")]
    JoinFailed,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            RelayError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            RelayError::Credential(e) => {
                let status = match e {
                    CredentialError::EmptyCredentials => StatusCode::BAD_REQUEST,
                    CredentialError::AlreadyExists => StatusCode::CONFLICT,
                    CredentialError::InvalidCredentials | CredentialError::InvalidToken => {
                        StatusCode::UNAUTHORIZED
                    }
                    CredentialError::Store(_) | CredentialError::Internal(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.error_code(), e.client_message())
            }
            RelayError::RoomClosed | RelayError::JoinFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ROOM_UNAVAILABLE",
                self.to_string(),
            ),
            RelayError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(target: "relay.http", error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn status_of(err: RelayError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        assert_eq!(status_of(RelayError::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_room_errors_map_to_503() {
        assert_eq!(
            status_of(RelayError::RoomClosed),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(RelayError::JoinFailed),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_credential_errors_keep_their_status() {
        let cases = [
            (CredentialError::EmptyCredentials, StatusCode::BAD_REQUEST),
            (CredentialError::AlreadyExists, StatusCode::CONFLICT),
            (CredentialError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CredentialError::InvalidToken, StatusCode::UNAUTHORIZED),
            (
                CredentialError::Store("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(status_of(RelayError::Credential(err)), expected);
        }
    }

    #[tokio::test]
    async fn test_body_uses_error_envelope() {
        let response = RelayError::Credential(CredentialError::AlreadyExists).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "ALREADY_EXISTS");
        assert_eq!(body["error"]["message"], "Username already exists");
    }

    #[tokio::test]
    async fn test_internal_details_never_reach_the_client() {
        let response = RelayError::Internal("pool exhausted at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }
}
