//! Credential engine error types.
//!
//! The taxonomy is deliberately small: callers branch on exactly these cases,
//! and the two authentication failures (unknown user, wrong password) collapse
//! into one variant so the boundary cannot be used for username enumeration.
//! Internal details are logged server-side, never surfaced to clients.

use crate::store::StoreError;
use thiserror::Error;

/// Credential engine error type.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Username or password was blank after trimming.
    #[error("Username and password must not be empty")]
    EmptyCredentials,

    /// The username is already taken.
    #[error("Username already exists")]
    AlreadyExists,

    /// Unknown user or password mismatch (indistinguishable on purpose).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Access or renewal token is invalid: bad signature, wrong algorithm,
    /// expired, revoked, or matching no stored record.
    #[error("The token is invalid or expired")]
    InvalidToken,

    /// Store backend failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error (crypto or signing failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CredentialError {
    /// Returns a stable, machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            CredentialError::EmptyCredentials => "EMPTY_CREDENTIALS",
            CredentialError::AlreadyExists => "ALREADY_EXISTS",
            CredentialError::InvalidCredentials => "INVALID_CREDENTIALS",
            CredentialError::InvalidToken => "INVALID_TOKEN",
            CredentialError::Store(_) | CredentialError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            CredentialError::Store(_) | CredentialError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => CredentialError::AlreadyExists,
            StoreError::Backend(msg) => CredentialError::Store(msg),
        }
    }
}
