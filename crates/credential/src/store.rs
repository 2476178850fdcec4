//! Credential storage trait and models.
//!
//! The engine is written against [`CredentialStore`] so the backing store is
//! swappable: the relay service binds a Postgres implementation, tests and
//! single-node deployments use the in-memory one from [`memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Storage backend error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (username already taken).
    #[error("Duplicate record")]
    Duplicate,

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A registered user account.
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: Uuid,
    /// Unique username (trimmed before storage).
    pub username: String,
    /// Optional contact address. Registration does not collect one; the
    /// field is populated only by account-management flows outside this
    /// engine.
    pub email: Option<String>,
    /// Bcrypt hash of the password.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

// Manual Debug so the password hash never lands in logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A stored renewal credential.
///
/// Only the SHA-256 hash of the renewal secret is persisted. The secret
/// itself is handed to the client once at issuance and never stored.
#[derive(Debug, Clone)]
pub struct RenewalCredential {
    /// Unique credential ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// SHA-256 hash of the renewal secret, lowercase hex.
    pub secret_hash: String,
    /// Optional client-supplied device label.
    pub device_id: Option<String>,
    /// Whether this credential has been used or revoked.
    pub revoked: bool,
    /// Hard expiry; the credential is unusable after this instant.
    pub expires_at: DateTime<Utc>,
    /// When the credential was created.
    pub created_at: DateTime<Utc>,
    /// When the credential was last updated (issuance or revocation).
    pub updated_at: DateTime<Utc>,
}

/// Storage backend for users and renewal credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates a new user.
    ///
    /// # Errors
    /// Returns [`StoreError::Duplicate`] if the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Fetches a user by username, or `None` if absent.
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fetches a user by ID, or `None` if absent.
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Persists a new renewal credential.
    async fn create_renewal(
        &self,
        user_id: Uuid,
        secret_hash: &str,
        device_id: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<RenewalCredential, StoreError>;

    /// Looks up a renewal credential by its secret hash, or `None` if absent.
    async fn renewal_by_hash(
        &self,
        secret_hash: &str,
    ) -> Result<Option<RenewalCredential>, StoreError>;

    /// Marks a renewal credential as revoked. A no-op for unknown IDs.
    async fn revoke_renewal(&self, id: Uuid) -> Result<(), StoreError>;

    /// Lists unrevoked, unexpired renewal credentials for a user, most
    /// recently updated first.
    async fn active_renewals_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RenewalCredential>, StoreError>;
}

/// In-memory [`CredentialStore`] backed by a mutex.
pub mod memory {
    use super::{
        async_trait, CredentialStore, DateTime, RenewalCredential, StoreError, User, Utc, Uuid,
    };
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    struct Inner {
        users: Vec<User>,
        renewals: Vec<RenewalCredential>,
    }

    /// Process-local credential store. All data is lost on restart.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
    }

    impl MemoryStore {
        /// Creates an empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
            self.inner
                .lock()
                .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn create_user(
            &self,
            username: &str,
            password_hash: &str,
        ) -> Result<User, StoreError> {
            let mut inner = self.lock()?;
            if inner.users.iter().any(|u| u.username == username) {
                return Err(StoreError::Duplicate);
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: None,
                password_hash: password_hash.to_string(),
                created_at: now,
                updated_at: now,
            };
            inner.users.push(user.clone());
            Ok(user)
        }

        async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            let inner = self.lock()?;
            Ok(inner.users.iter().find(|u| u.username == username).cloned())
        }

        async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            let inner = self.lock()?;
            Ok(inner.users.iter().find(|u| u.id == id).cloned())
        }

        async fn create_renewal(
            &self,
            user_id: Uuid,
            secret_hash: &str,
            device_id: Option<&str>,
            expires_at: DateTime<Utc>,
        ) -> Result<RenewalCredential, StoreError> {
            let mut inner = self.lock()?;
            let now = Utc::now();
            let credential = RenewalCredential {
                id: Uuid::new_v4(),
                user_id,
                secret_hash: secret_hash.to_string(),
                device_id: device_id.map(ToString::to_string),
                revoked: false,
                expires_at,
                created_at: now,
                updated_at: now,
            };
            inner.renewals.push(credential.clone());
            Ok(credential)
        }

        async fn renewal_by_hash(
            &self,
            secret_hash: &str,
        ) -> Result<Option<RenewalCredential>, StoreError> {
            let inner = self.lock()?;
            Ok(inner
                .renewals
                .iter()
                .find(|r| r.secret_hash == secret_hash)
                .cloned())
        }

        async fn revoke_renewal(&self, id: Uuid) -> Result<(), StoreError> {
            let mut inner = self.lock()?;
            if let Some(credential) = inner.renewals.iter_mut().find(|r| r.id == id) {
                credential.revoked = true;
                credential.updated_at = Utc::now();
            }
            Ok(())
        }

        async fn active_renewals_for_user(
            &self,
            user_id: Uuid,
        ) -> Result<Vec<RenewalCredential>, StoreError> {
            let inner = self.lock()?;
            let now = Utc::now();
            let mut active: Vec<RenewalCredential> = inner
                .renewals
                .iter()
                .filter(|r| r.user_id == user_id && !r.revoked && r.expires_at > now)
                .cloned()
                .collect();
            active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(active)
        }
    }
}
