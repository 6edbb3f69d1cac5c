//! Queries for the `keywords` table. Routine owner-scoped CRUD.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeywordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub term: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert a keyword for a user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including the unique
/// `(user_id, term)` violation).
pub async fn create_keyword(
    pool: &PgPool,
    user_id: Uuid,
    term: &str,
    notes: Option<&str>,
) -> Result<KeywordRow, DbError> {
    let row = sqlx::query_as::<_, KeywordRow>(
        "INSERT INTO keywords (user_id, term, notes) VALUES ($1, $2, $3) \
         RETURNING id, user_id, term, notes, created_at",
    )
    .bind(user_id)
    .bind(term)
    .bind(notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List a user's keywords, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_keywords(pool: &PgPool, user_id: Uuid) -> Result<Vec<KeywordRow>, DbError> {
    let rows = sqlx::query_as::<_, KeywordRow>(
        "SELECT id, user_id, term, notes, created_at FROM keywords \
         WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete an owned keyword.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn delete_keyword(pool: &PgPool, keyword_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM keywords WHERE id = $1 AND user_id = $2")
        .bind(keyword_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
