use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use venturepulse_core::SourceType;
use venturepulse_pipeline::{
    refresh_source as run_refresh, PgStore, RefreshError, RefreshTarget,
};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SourceItem {
    id: Uuid,
    name: String,
    source_type: SourceType,
    feed_url: Option<String>,
    is_active: bool,
    refreshed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<venturepulse_db::sources::TrendSourceRow> for SourceItem {
    fn from(row: venturepulse_db::sources::TrendSourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            source_type: row.source_type,
            feed_url: row.feed_url,
            is_active: row.is_active,
            refreshed_at: row.refreshed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TrendItem {
    external_id: String,
    title: String,
    origin: String,
    score: i32,
    comment_count: i32,
    hot_score: f64,
    url: String,
    published_at: DateTime<Utc>,
    source_id: Option<Uuid>,
}

impl From<venturepulse_db::signals::SignalRow> for TrendItem {
    fn from(row: venturepulse_db::signals::SignalRow) -> Self {
        Self {
            external_id: row.external_id,
            title: row.title,
            origin: row.origin,
            score: row.score,
            comment_count: row.comment_count,
            hot_score: row.hot_score,
            url: row.url,
            published_at: row.published_at,
            source_id: row.source_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateSourceBody {
    name: String,
    source_type: SourceType,
    feed_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateSourceBody {
    name: Option<String>,
    feed_url: Option<String>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshResult {
    source_id: Uuid,
    pruned_old: u64,
    pruned_today: u64,
    fetched: usize,
    inserted: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshAllResult {
    refreshed: Vec<RefreshResult>,
    failed: Vec<Uuid>,
}

/// Source management and manual refresh require admin authority; the
/// check happens before any state is touched.
fn require_admin(state: &AppState, user: &CurrentUser, req_id: &str) -> Result<(), ApiError> {
    if state.policy.is_admin(&user.email) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "forbidden",
            "admin authority required",
        ))
    }
}

pub(super) async fn list_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<TrendItem>>>, ApiError> {
    let rows =
        venturepulse_db::signals::find_trend_signals(&state.pool, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(TrendItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_sources(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<SourceItem>>>, ApiError> {
    let rows = venturepulse_db::sources::list_sources(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SourceItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateSourceBody>,
) -> Result<Json<ApiResponse<SourceItem>>, ApiError> {
    require_admin(&state, &user, &req_id.0)?;

    if body.name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "source name is required",
        ));
    }

    let row = venturepulse_db::sources::create_source(
        &state.pool,
        body.name.trim(),
        body.source_type,
        body.feed_url.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(source_id): Path<Uuid>,
    Json(body): Json<UpdateSourceBody>,
) -> Result<Json<ApiResponse<SourceItem>>, ApiError> {
    require_admin(&state, &user, &req_id.0)?;

    let row = venturepulse_db::sources::update_source(
        &state.pool,
        source_id,
        body.name.as_deref(),
        body.feed_url.as_deref(),
        body.is_active,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(&state, &user, &req_id.0)?;

    venturepulse_db::sources::delete_source(&state.pool, source_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: (),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_source_signals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(source_id): Path<Uuid>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<TrendItem>>>, ApiError> {
    let rows = venturepulse_db::signals::find_signals_by_source(
        &state.pool,
        source_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(TrendItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn refresh_source(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<ApiResponse<RefreshResult>>, ApiError> {
    require_admin(&state, &user, &req_id.0)?;

    let source = venturepulse_db::sources::get_source(&state.pool, source_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    // The refresh cycle starts with a destructive prune; an inactive
    // source must be rejected before any of it runs.
    if !source.is_active {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "source is inactive; activate it before refreshing",
        ));
    }

    let result = refresh_one(&state, &source).await.map_err(|e| match e {
        RefreshError::AlreadyRunning(_) => ApiError::new(
            req_id.0.clone(),
            "conflict",
            "a refresh for this source is already running",
        ),
        RefreshError::Fetch(e) => {
            tracing::warn!(%source_id, error = %e, "trend fetch failed");
            ApiError::new(req_id.0.clone(), "upstream_error", "trend source unavailable")
        }
        RefreshError::Store(e) => map_db_error(req_id.0.clone(), &e),
    })?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Refresh every active source, continuing past individual failures.
pub(super) async fn refresh_all(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<RefreshAllResult>>, ApiError> {
    require_admin(&state, &user, &req_id.0)?;

    let sources = venturepulse_db::sources::list_active_sources(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut refreshed = Vec::new();
    let mut failed = Vec::new();
    for source in &sources {
        match refresh_one(&state, source).await {
            Ok(result) => refreshed.push(result),
            Err(e) => {
                tracing::warn!(source_id = %source.id, error = %e, "source refresh failed");
                failed.push(source.id);
            }
        }
    }

    Ok(Json(ApiResponse {
        data: RefreshAllResult { refreshed, failed },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn refresh_one(
    state: &AppState,
    source: &venturepulse_db::sources::TrendSourceRow,
) -> Result<RefreshResult, RefreshError> {
    let store = PgStore::new(state.pool.clone());
    let target = RefreshTarget {
        id: source.id,
        source_type: source.source_type,
        feed_url: source.feed_url.clone(),
    };

    let report = run_refresh(
        &store,
        state.feed.as_ref(),
        &state.locks,
        &target,
        state.config.refresh_item_limit,
        Utc::now(),
    )
    .await?;

    Ok(RefreshResult {
        source_id: source.id,
        pruned_old: report.pruned_old,
        pruned_today: report.pruned_today,
        fetched: report.fetched,
        inserted: report.inserted,
    })
}
