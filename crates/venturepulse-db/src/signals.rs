//! Queries for the `signals` table.
//!
//! A signal row is owned by exactly one of a project (validation evidence)
//! or a trend source (ranked feed item). Trend rows live inside a rolling
//! two-day window maintained by the refresh orchestrator; project rows are
//! kept for as long as the project exists.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use venturepulse_core::SignalItem;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalRow {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub content: Option<String>,
    pub origin: String,
    pub score: i32,
    pub comment_count: i32,
    pub hot_score: f64,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub project_id: Option<Uuid>,
    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

const SIGNAL_COLUMNS: &str = "id, external_id, title, content, origin, score, comment_count, \
     hot_score, url, published_at, project_id, source_id, created_at";

/// External identifiers of all signals currently persisted for a source.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_signal_ids_by_source(
    pool: &PgPool,
    source_id: Uuid,
) -> Result<HashSet<String>, DbError> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT external_id FROM signals WHERE source_id = $1")
            .bind(source_id)
            .fetch_all(pool)
            .await?;

    Ok(ids.into_iter().collect())
}

/// Delete a source's signals created strictly before the cutoff.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_signals_before(
    pool: &PgPool,
    source_id: Uuid,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM signals WHERE source_id = $1 AND created_at < $2")
        .bind(source_id)
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete a source's signals created at or after the cutoff.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_signals_since(
    pool: &PgPool,
    source_id: Uuid,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM signals WHERE source_id = $1 AND created_at >= $2")
        .bind(source_id)
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Bulk-insert trend signals for a source. A no-op for an empty batch.
///
/// Each item is stored with its precomputed hot score.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn bulk_insert_trend_signals(
    pool: &PgPool,
    source_id: Uuid,
    items: &[(SignalItem, f64)],
) -> Result<u64, DbError> {
    if items.is_empty() {
        return Ok(0);
    }

    let mut external_ids = Vec::with_capacity(items.len());
    let mut titles = Vec::with_capacity(items.len());
    let mut origins = Vec::with_capacity(items.len());
    let mut scores = Vec::with_capacity(items.len());
    let mut comment_counts = Vec::with_capacity(items.len());
    let mut hot_scores = Vec::with_capacity(items.len());
    let mut urls = Vec::with_capacity(items.len());
    let mut published = Vec::with_capacity(items.len());

    for (item, hot) in items {
        external_ids.push(item.external_id.clone());
        titles.push(item.title.clone());
        origins.push(item.origin.clone());
        scores.push(item.score);
        comment_counts.push(item.comment_count);
        hot_scores.push(*hot);
        urls.push(item.url.clone());
        published.push(item.published_at);
    }

    let result = sqlx::query(
        "INSERT INTO signals \
             (external_id, title, origin, score, comment_count, hot_score, url, published_at, source_id) \
         SELECT *, $9::uuid FROM UNNEST \
             ($1::text[], $2::text[], $3::text[], $4::int[], $5::int[], $6::float8[], $7::text[], $8::timestamptz[])",
    )
    .bind(&external_ids)
    .bind(&titles)
    .bind(&origins)
    .bind(&scores)
    .bind(&comment_counts)
    .bind(&hot_scores)
    .bind(&urls)
    .bind(&published)
    .bind(source_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Fetch already-persisted community posts matching any of the given
/// external identifiers.
///
/// The lookup is global across projects: the same external post surfaced by
/// two different projects' runs is stored once and reused.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_project_signals_by_external_ids(
    pool: &PgPool,
    external_ids: &[String],
) -> Result<Vec<SignalRow>, DbError> {
    if external_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, SignalRow>(&format!(
        "SELECT {SIGNAL_COLUMNS} FROM signals \
         WHERE project_id IS NOT NULL AND external_id = ANY($1)"
    ))
    .bind(external_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert one community post as validation evidence for a project.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a unique
/// violation on `external_id` for project-owned rows).
pub async fn insert_project_signal(
    pool: &PgPool,
    project_id: Uuid,
    item: &SignalItem,
) -> Result<SignalRow, DbError> {
    let row = sqlx::query_as::<_, SignalRow>(&format!(
        "INSERT INTO signals \
             (external_id, title, content, origin, score, comment_count, url, published_at, project_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {SIGNAL_COLUMNS}"
    ))
    .bind(&item.external_id)
    .bind(&item.title)
    .bind(&item.content)
    .bind(&item.origin)
    .bind(item.score)
    .bind(item.comment_count)
    .bind(&item.url)
    .bind(item.published_at)
    .bind(project_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// A project's validation evidence, most popular first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_signals_by_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<SignalRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalRow>(&format!(
        "SELECT {SIGNAL_COLUMNS} FROM signals \
         WHERE project_id = $1 ORDER BY score DESC, id ASC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Current trend signals across every source, hottest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_trend_signals(pool: &PgPool, limit: i64) -> Result<Vec<SignalRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalRow>(&format!(
        "SELECT {SIGNAL_COLUMNS} FROM signals \
         WHERE source_id IS NOT NULL ORDER BY hot_score DESC, id ASC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A source's current trend signals, hottest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_signals_by_source(
    pool: &PgPool,
    source_id: Uuid,
    limit: i64,
) -> Result<Vec<SignalRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalRow>(&format!(
        "SELECT {SIGNAL_COLUMNS} FROM signals \
         WHERE source_id = $1 ORDER BY hot_score DESC, id ASC LIMIT $2"
    ))
    .bind(source_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
