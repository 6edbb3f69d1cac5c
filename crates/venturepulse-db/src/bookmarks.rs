//! Queries for the `bookmarks` table. Routine owner-scoped CRUD.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookmarkRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub url: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert a bookmark for a user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_bookmark(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    url: &str,
    notes: Option<&str>,
) -> Result<BookmarkRow, DbError> {
    let row = sqlx::query_as::<_, BookmarkRow>(
        "INSERT INTO bookmarks (user_id, title, url, notes) VALUES ($1, $2, $3, $4) \
         RETURNING id, user_id, title, url, notes, created_at",
    )
    .bind(user_id)
    .bind(title)
    .bind(url)
    .bind(notes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List a user's bookmarks, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_bookmarks(pool: &PgPool, user_id: Uuid) -> Result<Vec<BookmarkRow>, DbError> {
    let rows = sqlx::query_as::<_, BookmarkRow>(
        "SELECT id, user_id, title, url, notes, created_at FROM bookmarks \
         WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Delete an owned bookmark.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn delete_bookmark(
    pool: &PgPool,
    bookmark_id: Uuid,
    user_id: Uuid,
) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND user_id = $2")
        .bind(bookmark_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
