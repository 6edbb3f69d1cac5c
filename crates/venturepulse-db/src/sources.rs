//! Queries for the `trend_sources` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use venturepulse_core::SourceType;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendSourceRow {
    pub id: Uuid,
    pub name: String,
    pub source_type: SourceType,
    pub feed_url: Option<String>,
    pub is_active: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const SOURCE_COLUMNS: &str =
    "id, name, source_type, feed_url, is_active, refreshed_at, created_at";

/// Insert a new trend source.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_source(
    pool: &PgPool,
    name: &str,
    source_type: SourceType,
    feed_url: Option<&str>,
) -> Result<TrendSourceRow, DbError> {
    let row = sqlx::query_as::<_, TrendSourceRow>(&format!(
        "INSERT INTO trend_sources (name, source_type, feed_url) \
         VALUES ($1, $2, $3) \
         RETURNING {SOURCE_COLUMNS}"
    ))
    .bind(name)
    .bind(source_type)
    .bind(feed_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List all sources, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sources(pool: &PgPool) -> Result<Vec<TrendSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM trend_sources ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List only active sources — the set the scheduled refresh walks.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_sources(pool: &PgPool) -> Result<Vec<TrendSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM trend_sources WHERE is_active ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch one source by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the source does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_source(pool: &PgPool, source_id: Uuid) -> Result<TrendSourceRow, DbError> {
    sqlx::query_as::<_, TrendSourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} FROM trend_sources WHERE id = $1"
    ))
    .bind(source_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Update a source's name, feed URL, or active flag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn update_source(
    pool: &PgPool,
    source_id: Uuid,
    name: Option<&str>,
    feed_url: Option<&str>,
    is_active: Option<bool>,
) -> Result<TrendSourceRow, DbError> {
    sqlx::query_as::<_, TrendSourceRow>(&format!(
        "UPDATE trend_sources SET \
             name = COALESCE($2, name), \
             feed_url = COALESCE($3, feed_url), \
             is_active = COALESCE($4, is_active) \
         WHERE id = $1 \
         RETURNING {SOURCE_COLUMNS}"
    ))
    .bind(source_id)
    .bind(name)
    .bind(feed_url)
    .bind(is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Delete a source (cascades to its signals).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn delete_source(pool: &PgPool, source_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM trend_sources WHERE id = $1")
        .bind(source_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stamp a source's `refreshed_at`. Called only after a refresh cycle's
/// insert step completed without a fatal error.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the source does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_source_refreshed_at(
    pool: &PgPool,
    source_id: Uuid,
    refreshed_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE trend_sources SET refreshed_at = $2 WHERE id = $1")
        .bind(source_id)
        .bind(refreshed_at)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
