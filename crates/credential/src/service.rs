//! Credential service: registration, login, rotation, session listing.
//!
//! All operations go through the [`CredentialStore`] trait; the service holds
//! no state of its own beyond the signer and the renewal lifetime. Renewal
//! secrets are single-use: rotation revokes the presented secret before the
//! replacement is issued, so an old and a new secret are never valid at the
//! same time.

use crate::errors::CredentialError;
use crate::signer::TokenSigner;
use crate::store::{CredentialStore, RenewalCredential, User};
use chrono::Utc;
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// Renewal secrets are 32 random bytes, rendered as 64 lowercase hex chars.
const RENEWAL_SECRET_BYTES: usize = 32;

/// Dummy bcrypt hash verified when the user is unknown, so lookups of missing
/// users and password mismatches take comparable time.
const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Result of a successful register, login, or rotate.
///
/// `renewal_secret` is the plaintext secret. It is handed to the client here
/// and never again; only its SHA-256 hash is stored.
pub struct IssuedCredentials {
    /// The authenticated user.
    pub user: User,
    /// Signed access token.
    pub access_token: String,
    /// Plaintext renewal secret, shown exactly once.
    pub renewal_secret: String,
}

impl fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("user", &self.user)
            .field("access_token", &"[REDACTED]")
            .field("renewal_secret", &"[REDACTED]")
            .finish()
    }
}

/// Hashes a renewal secret for storage or lookup (SHA-256, lowercase hex).
#[must_use]
pub fn hash_renewal_secret(secret: &str) -> String {
    hex::encode(digest(&SHA256, secret.as_bytes()))
}

/// Account and token lifecycle operations over a pluggable store.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    signer: TokenSigner,
    renewal_ttl: Duration,
}

impl CredentialService {
    /// Creates a service over the given store and signer.
    pub fn new(store: Arc<dyn CredentialStore>, signer: TokenSigner, renewal_ttl: Duration) -> Self {
        Self {
            store,
            signer,
            renewal_ttl,
        }
    }

    /// Registers a new user and issues an initial credential pair.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::EmptyCredentials`] if username (after trimming)
    ///   or password is blank.
    /// - [`CredentialError::AlreadyExists`] if the username is taken.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<IssuedCredentials, CredentialError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CredentialError::EmptyCredentials);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| CredentialError::Internal(format!("password hashing failed: {}", e)))?;

        let user = self.store.create_user(username, &password_hash).await?;

        tracing::info!(user_id = %user.id, "User registered");

        self.issue_pair(user, device_id).await
    }

    /// Authenticates a user by password and issues a fresh credential pair.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::EmptyCredentials`] if username (after trimming)
    ///   or password is blank.
    /// - [`CredentialError::InvalidCredentials`] for an unknown user or a
    ///   password mismatch. The two cases are indistinguishable to callers.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<IssuedCredentials, CredentialError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(CredentialError::EmptyCredentials);
        }

        let user = self.store.user_by_username(username).await?;

        // Always run bcrypt to prevent timing attacks
        // Use dummy hash if the user was not found (constant-time operation)
        let hash_to_verify = match &user {
            Some(u) => u.password_hash.as_str(),
            None => DUMMY_BCRYPT_HASH,
        };
        let is_valid = bcrypt::verify(password, hash_to_verify).map_err(|e| {
            CredentialError::Internal(format!("password verification failed: {}", e))
        })?;

        let user = user.ok_or(CredentialError::InvalidCredentials)?;
        if !is_valid {
            return Err(CredentialError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_pair(user, device_id).await
    }

    /// Exchanges a renewal secret for a fresh credential pair.
    ///
    /// The presented secret is revoked before the replacement is issued;
    /// rotation is single-use with no automatic retry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidToken`] when the secret matches no
    /// record, the record is revoked or expired, or its user no longer
    /// exists.
    #[instrument(skip_all)]
    pub async fn rotate(
        &self,
        renewal_secret: &str,
        device_id: Option<&str>,
    ) -> Result<IssuedCredentials, CredentialError> {
        let secret_hash = hash_renewal_secret(renewal_secret);

        let record = self
            .store
            .renewal_by_hash(&secret_hash)
            .await?
            .ok_or(CredentialError::InvalidToken)?;

        if record.revoked {
            tracing::warn!(credential_id = %record.id, "Rotation attempted with revoked secret");
            return Err(CredentialError::InvalidToken);
        }

        if Utc::now() > record.expires_at {
            return Err(CredentialError::InvalidToken);
        }

        self.store.revoke_renewal(record.id).await?;

        let user = self
            .store
            .user_by_id(record.user_id)
            .await?
            .ok_or(CredentialError::InvalidToken)?;

        // A rotation without an explicit device keeps the old record's label.
        let device_id = device_id.or(record.device_id.as_deref());

        tracing::info!(user_id = %user.id, "Credentials rotated");

        self.issue_pair(user, device_id).await
    }

    /// Lists unrevoked, unexpired renewal credentials for a user, most
    /// recently used first.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Store`] on backend failure.
    pub async fn list_active_sessions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RenewalCredential>, CredentialError> {
        Ok(self.store.active_renewals_for_user(user_id).await?)
    }

    /// Issues an access token plus a stored renewal credential for `user`.
    async fn issue_pair(
        &self,
        user: User,
        device_id: Option<&str>,
    ) -> Result<IssuedCredentials, CredentialError> {
        let access_token = self.signer.issue(user.id, &user.username)?;

        let renewal_secret = generate_renewal_secret()?;
        let secret_hash = hash_renewal_secret(&renewal_secret);

        let ttl = chrono::Duration::from_std(self.renewal_ttl)
            .map_err(|e| CredentialError::Internal(format!("renewal TTL out of range: {}", e)))?;
        let expires_at = Utc::now() + ttl;

        self.store
            .create_renewal(user.id, &secret_hash, device_id, expires_at)
            .await?;

        Ok(IssuedCredentials {
            user,
            access_token,
            renewal_secret,
        })
    }
}

/// Generates a renewal secret: 32 CSPRNG bytes as lowercase hex.
fn generate_renewal_secret() -> Result<String, CredentialError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; RENEWAL_SECRET_BYTES];
    SecureRandom::fill(&rng, &mut bytes)
        .map_err(|e| CredentialError::Internal(format!("secret generation failed: {}", e)))?;
    Ok(hex::encode(bytes))
}
