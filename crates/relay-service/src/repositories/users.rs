//! User repository module for database operations.

use chrono::{DateTime, Utc};
use credential::store::{StoreError, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Row shape of the users table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create a new user. Usernames are globally unique; the email column stays
/// NULL until an account-management flow fills it.
pub async fn create(pool: &PgPool, username: &str, password_hash: &str) -> Result<User, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        // Unique constraint violation means the username is taken
        if e.to_string().contains("users_username_key") {
            StoreError::Duplicate
        } else {
            StoreError::Backend(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(row.into())
}

/// Get user by username.
pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to fetch user by username: {}", e)))?;

    Ok(row.map(Into::into))
}

/// Get user by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StoreError::Backend(format!("Failed to fetch user by id: {}", e)))?;

    Ok(row.map(Into::into))
}
