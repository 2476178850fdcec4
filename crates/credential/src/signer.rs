//! Access token issuance and verification.
//!
//! Access tokens are HS256 JWTs signed with a single shared secret. The
//! relay verifies tokens in-process, so there is no key distribution and no
//! asymmetric signing. Verification pins the algorithm: a token whose header
//! declares anything other than HS256 is rejected regardless of signature.

use crate::errors::CredentialError;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// Maximum allowed JWT size in bytes (4KB).
///
/// Tokens issued here are a few hundred bytes. Oversized tokens are rejected
/// before any parsing or cryptographic work to keep resource usage bounded.
const MAX_JWT_SIZE_BYTES: usize = 4096;

/// Access token claims.
///
/// The `username` field identifies a person and should not be exposed in
/// logs. A custom Debug implementation redacts it.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Owning user's ID.
    pub user_id: Uuid,
    /// Username at issuance time.
    pub username: String,
    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,
    /// Expiration timestamp (Unix seconds).
    pub exp: i64,
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("user_id", &self.user_id)
            .field("username", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Verifies access tokens presented at the relay boundary.
///
/// HTTP middleware and the WebSocket join path take a verifier rather than
/// the full signer, since neither ever issues tokens.
pub trait AccessVerifier: Send + Sync {
    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidToken`] for any malformed, expired,
    /// tampered, or wrong-algorithm token. The reason is logged server-side
    /// and never distinguished for the caller.
    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, CredentialError>;
}

/// Issues and verifies HS256 access tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
}

impl TokenSigner {
    /// Creates a signer from the shared secret and access token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl: Duration) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Expiry is strict. The library default allows 60 seconds of leeway.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            validation,
            access_ttl_secs: i64::try_from(access_ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Issues a new access token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Internal`] if the signing operation fails.
    #[instrument(skip_all)]
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, CredentialError> {
        let iat = chrono::Utc::now().timestamp();
        let exp = iat.saturating_add(self.access_ttl_secs);
        let claims = AccessClaims {
            user_id,
            username: username.to_string(),
            iat,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(target: "credential.signer", "JWT signing operation failed");
            CredentialError::Internal(format!("JWT signing failed: {}", e))
        })
    }
}

impl AccessVerifier for TokenSigner {
    #[instrument(skip_all)]
    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, CredentialError> {
        // Check token size BEFORE any parsing or cryptographic operations
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "credential.signer",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(CredentialError::InvalidToken);
        }

        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(target: "credential.signer", error = %e, "Token verification failed");
                CredentialError::InvalidToken
            })?;

        Ok(token_data.claims)
    }
}
