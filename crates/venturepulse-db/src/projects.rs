//! Queries for the `projects` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use venturepulse_core::ValidationStatus;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub idea: String,
    pub target_market: Option<String>,
    pub validation_status: ValidationStatus,
    pub validation_keywords: Vec<String>,
    pub validation_score: Option<i32>,
    pub validation_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied when the validation pipeline commits or rolls back.
///
/// `None` fields are left untouched; `score`/`summary` use the inner option
/// to distinguish "keep" (`None`) from "set to NULL" (`Some(None)`).
#[allow(clippy::option_option)]
#[derive(Debug, Default, Clone)]
pub struct ValidationUpdate {
    pub status: Option<ValidationStatus>,
    pub keywords: Option<Vec<String>>,
    pub score: Option<Option<i32>>,
    pub summary: Option<Option<String>>,
}

const PROJECT_COLUMNS: &str = "id, user_id, name, idea, target_market, validation_status, \
     validation_keywords, validation_score, validation_summary, created_at, updated_at";

/// Insert a new project in the `idea` state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_project(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    idea: &str,
    target_market: Option<&str>,
) -> Result<ProjectRow, DbError> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "INSERT INTO projects (user_id, name, idea, target_market) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(user_id)
    .bind(name)
    .bind(idea)
    .bind(target_market)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List a user's projects, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_projects(pool: &PgPool, user_id: Uuid) -> Result<Vec<ProjectRow>, DbError> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch one project owned by the given user.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such project exists for that owner,
/// or [`DbError::Sqlx`] on query failure.
pub async fn get_project_for_user(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectRow, DbError> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2"
    ))
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetch one project by id regardless of owner. Pipeline-internal.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_project(pool: &PgPool, project_id: Uuid) -> Result<ProjectRow, DbError> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Update name/idea/target-market of an owned project.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn update_project(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    target_market: Option<&str>,
) -> Result<ProjectRow, DbError> {
    sqlx::query_as::<_, ProjectRow>(&format!(
        "UPDATE projects SET \
             name = COALESCE($3, name), \
             target_market = COALESCE($4, target_market), \
             updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(project_id)
    .bind(user_id)
    .bind(name)
    .bind(target_market)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Delete an owned project (cascades to its signals).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`] on
/// query failure.
pub async fn delete_project(pool: &PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Apply a partial validation-state update to a project.
///
/// This is the single write path the validation state machine uses for the
/// VALIDATING entry action, the final commit, and the best-effort rollback.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn set_project_validation(
    pool: &PgPool,
    project_id: Uuid,
    update: &ValidationUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE projects SET \
             validation_status = COALESCE($2, validation_status), \
             validation_keywords = COALESCE($3, validation_keywords), \
             validation_score = CASE WHEN $4 THEN $5 ELSE validation_score END, \
             validation_summary = CASE WHEN $6 THEN $7 ELSE validation_summary END, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(project_id)
    .bind(update.status)
    .bind(update.keywords.as_deref())
    .bind(update.score.is_some())
    .bind(update.score.clone().flatten())
    .bind(update.summary.is_some())
    .bind(update.summary.clone().flatten())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
