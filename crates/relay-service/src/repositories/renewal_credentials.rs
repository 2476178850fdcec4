//! Renewal credential repository module for database operations.
//!
//! Stores only the SHA-256 hash of each renewal secret. Spent credentials
//! stay on the table as revoked rows so active-session listings and audits
//! can see the rotation history until expiry cleanup.

use chrono::{DateTime, Utc};
use credential::store::{RenewalCredential, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

/// Row shape of the renewal_credentials table.
#[derive(Debug, sqlx::FromRow)]
struct RenewalRow {
    id: Uuid,
    user_id: Uuid,
    secret_hash: String,
    device_id: Option<String>,
    revoked: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RenewalRow> for RenewalCredential {
    fn from(row: RenewalRow) -> Self {
        RenewalCredential {
            id: row.id,
            user_id: row.user_id,
            secret_hash: row.secret_hash,
            device_id: row.device_id,
            revoked: row.revoked,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create a renewal credential record for a user.
pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    secret_hash: &str,
    device_id: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<RenewalCredential, StoreError> {
    let row = sqlx::query_as::<_, RenewalRow>(
        r#"
        INSERT INTO renewal_credentials (user_id, secret_hash, device_id, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, secret_hash, device_id, revoked,
                  expires_at, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(secret_hash)
    .bind(device_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to create renewal credential: {}", e)))?;

    Ok(row.into())
}

/// Look up a renewal credential by its secret hash.
pub async fn get_by_secret_hash(
    pool: &PgPool,
    secret_hash: &str,
) -> Result<Option<RenewalCredential>, StoreError> {
    let row = sqlx::query_as::<_, RenewalRow>(
        r#"
        SELECT id, user_id, secret_hash, device_id, revoked,
               expires_at, created_at, updated_at
        FROM renewal_credentials
        WHERE secret_hash = $1
        "#,
    )
    .bind(secret_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to fetch renewal credential: {}", e)))?;

    Ok(row.map(Into::into))
}

/// Mark a renewal credential revoked. Revoking an unknown id is a no-op.
pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE renewal_credentials
        SET revoked = TRUE, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to revoke renewal credential: {}", e)))?;

    Ok(())
}

/// List a user's unrevoked, unexpired credentials, most recently used first.
pub async fn list_active_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<RenewalCredential>, StoreError> {
    let rows = sqlx::query_as::<_, RenewalRow>(
        r#"
        SELECT id, user_id, secret_hash, device_id, revoked,
               expires_at, created_at, updated_at
        FROM renewal_credentials
        WHERE user_id = $1 AND revoked = FALSE AND expires_at > NOW()
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to list renewal credentials: {}", e)))?;

    Ok(rows.into_iter().map(Into::into).collect())
}
