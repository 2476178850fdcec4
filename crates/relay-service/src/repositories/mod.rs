//! Postgres persistence layer.
//!
//! Each table gets a module of free query functions over a [`PgPool`], and
//! [`PgCredentialStore`] packages them behind the credential engine's store
//! trait.

pub mod renewal_credentials;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credential::store::{CredentialStore, RenewalCredential, StoreError, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed implementation of the credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        users::create(&self.pool, username, password_hash).await
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        users::get_by_username(&self.pool, username).await
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        users::get_by_id(&self.pool, id).await
    }

    async fn create_renewal(
        &self,
        user_id: Uuid,
        secret_hash: &str,
        device_id: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<RenewalCredential, StoreError> {
        renewal_credentials::create(&self.pool, user_id, secret_hash, device_id, expires_at).await
    }

    async fn renewal_by_hash(
        &self,
        secret_hash: &str,
    ) -> Result<Option<RenewalCredential>, StoreError> {
        renewal_credentials::get_by_secret_hash(&self.pool, secret_hash).await
    }

    async fn revoke_renewal(&self, id: Uuid) -> Result<(), StoreError> {
        renewal_credentials::revoke(&self.pool, id).await
    }

    async fn active_renewals_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RenewalCredential>, StoreError> {
        renewal_credentials::list_active_for_user(&self.pool, user_id).await
    }
}
