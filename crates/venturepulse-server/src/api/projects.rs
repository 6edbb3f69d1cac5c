use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use venturepulse_db::projects::ValidationUpdate;
use venturepulse_pipeline::{validate_project as run_validation, PgStore, ValidationError, ValidationOptions};
use venturepulse_signals::{RedditClient, SearchOptions};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProjectItem {
    id: Uuid,
    name: String,
    idea: String,
    target_market: Option<String>,
    validation_status: venturepulse_core::ValidationStatus,
    validation_keywords: Vec<String>,
    validation_score: Option<i32>,
    validation_summary: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<venturepulse_db::projects::ProjectRow> for ProjectItem {
    fn from(row: venturepulse_db::projects::ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            idea: row.idea,
            target_market: row.target_market,
            validation_status: row.validation_status,
            validation_keywords: row.validation_keywords,
            validation_score: row.validation_score,
            validation_summary: row.validation_summary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SignalItemBody {
    external_id: String,
    title: String,
    content: Option<String>,
    origin: String,
    score: i32,
    comment_count: i32,
    url: String,
    published_at: DateTime<Utc>,
}

impl From<venturepulse_db::signals::SignalRow> for SignalItemBody {
    fn from(row: venturepulse_db::signals::SignalRow) -> Self {
        Self {
            external_id: row.external_id,
            title: row.title,
            content: row.content,
            origin: row.origin,
            score: row.score,
            comment_count: row.comment_count,
            url: row.url,
            published_at: row.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProjectBody {
    name: String,
    idea: String,
    target_market: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProjectBody {
    name: Option<String>,
    target_market: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ValidateBody {
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(super) struct ValidationResult {
    keywords: Vec<String>,
    signals_found: usize,
    newly_stored: usize,
    score: Option<i32>,
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ExtractedKeywords {
    keywords: Vec<String>,
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<ProjectItem>>>, ApiError> {
    let rows = venturepulse_db::projects::list_projects(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProjectItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateProjectBody>,
) -> Result<Json<ApiResponse<ProjectItem>>, ApiError> {
    if body.name.trim().is_empty() || body.idea.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "name and idea are required",
        ));
    }

    let row = venturepulse_db::projects::create_project(
        &state.pool,
        user.id,
        body.name.trim(),
        body.idea.trim(),
        body.target_market.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectItem>>, ApiError> {
    let row = venturepulse_db::projects::get_project_for_user(&state.pool, project_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<UpdateProjectBody>,
) -> Result<Json<ApiResponse<ProjectItem>>, ApiError> {
    let row = venturepulse_db::projects::update_project(
        &state.pool,
        project_id,
        user.id,
        body.name.as_deref(),
        body.target_market.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    venturepulse_db::projects::delete_project(&state.pool, project_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: (),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_project_signals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SignalItemBody>>>, ApiError> {
    // Ownership check first; signals are only visible through owned projects.
    venturepulse_db::projects::get_project_for_user(&state.pool, project_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = venturepulse_db::signals::find_signals_by_project(&state.pool, project_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SignalItemBody::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Run the full validation pipeline for an owned project.
pub(super) async fn validate_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    body: Option<Json<ValidateBody>>,
) -> Result<Json<ApiResponse<ValidationResult>>, ApiError> {
    venturepulse_db::projects::get_project_for_user(&state.pool, project_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // Reject unusable explicit keywords before talking to anything external.
    let keywords = body.and_then(|Json(b)| b.keywords);
    if let Some(provided) = &keywords {
        if provided.iter().all(|k| k.trim().is_empty()) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "keywords must contain at least one non-empty term",
            ));
        }
    }

    let search = connect_reddit(&state, &req_id.0).await?;

    let opts = ValidationOptions {
        search: SearchOptions {
            limit: state.config.search_result_limit,
            ..SearchOptions::default()
        },
        ..ValidationOptions::default()
    };

    let store = PgStore::new(state.pool.clone());
    let report = run_validation(
        &store,
        &search,
        state.analyst.as_ref(),
        project_id,
        keywords,
        &opts,
    )
    .await
    .map_err(|failure| {
        if let Some(rollback) = &failure.rollback_error {
            tracing::error!(
                %project_id,
                error = %rollback,
                "project left mid-validation; rollback failed"
            );
        }
        match failure.primary {
            ValidationError::EmptyKeywords => ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "no usable validation keywords",
            ),
            ValidationError::Search(e) => {
                tracing::warn!(%project_id, error = %e, "community search failed");
                ApiError::new(
                    req_id.0.clone(),
                    "upstream_error",
                    "community search unavailable",
                )
            }
            ValidationError::Store(e) => map_db_error(req_id.0.clone(), &e),
        }
    })?;

    Ok(Json(ApiResponse {
        data: ValidationResult {
            keywords: report.keywords,
            signals_found: report.signals_found,
            newly_stored: report.newly_stored,
            score: report.score,
            summary: report.summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Derive and persist search keywords for a project without running the
/// full pipeline.
pub(super) async fn extract_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ExtractedKeywords>>, ApiError> {
    let project =
        venturepulse_db::projects::get_project_for_user(&state.pool, project_id, user.id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let keywords = state
        .analyst
        .extract_keywords(&project.name, &project.idea, project.target_market.as_deref())
        .await;

    venturepulse_db::projects::set_project_validation(
        &state.pool,
        project_id,
        &ValidationUpdate {
            keywords: Some(keywords.clone()),
            ..ValidationUpdate::default()
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ExtractedKeywords { keywords },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn connect_reddit(state: &AppState, req_id: &str) -> Result<RedditClient, ApiError> {
    let (Some(client_id), Some(client_secret)) = (
        state.config.reddit_client_id.clone(),
        state.config.reddit_client_secret.clone(),
    ) else {
        return Err(ApiError::new(
            req_id,
            "upstream_error",
            "reddit credentials are not configured",
        ));
    };

    RedditClient::connect(&venturepulse_signals::sources::RedditCredentials {
        client_id,
        client_secret,
        user_agent: state.config.reddit_user_agent.clone(),
    })
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, "reddit token exchange failed");
        ApiError::new(req_id, "upstream_error", "reddit authentication failed")
    })
}
