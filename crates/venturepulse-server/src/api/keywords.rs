use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct KeywordItem {
    id: Uuid,
    term: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<venturepulse_db::keywords::KeywordRow> for KeywordItem {
    fn from(row: venturepulse_db::keywords::KeywordRow) -> Self {
        Self {
            id: row.id,
            term: row.term,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateKeywordBody {
    term: String,
    notes: Option<String>,
}

pub(super) async fn list_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<KeywordItem>>>, ApiError> {
    let rows = venturepulse_db::keywords::list_keywords(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(KeywordItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_keyword(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateKeywordBody>,
) -> Result<Json<ApiResponse<KeywordItem>>, ApiError> {
    if body.term.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "term is required",
        ));
    }

    let row = venturepulse_db::keywords::create_keyword(
        &state.pool,
        user.id,
        body.term.trim(),
        body.notes.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_keyword(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(keyword_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    venturepulse_db::keywords::delete_keyword(&state.pool, keyword_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: (),
        meta: ResponseMeta::new(req_id.0),
    }))
}
