//! Queries for the `users` table.
//!
//! Identity is externalized to whatever issued the API token; this module
//! only maps a presented token back to an internal user row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Resolve an API token to its user, or `None` for an unknown token.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_user_by_token(pool: &PgPool, token: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, display_name, created_at FROM users WHERE api_token = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a user, returning its id. Used by seeding and tests.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including unique-email
/// violations).
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    api_token: &str,
    display_name: Option<&str>,
) -> Result<Uuid, DbError> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, api_token, display_name) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(email)
    .bind(api_token)
    .bind(display_name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
