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
pub(super) struct BookmarkItem {
    id: Uuid,
    title: String,
    url: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<venturepulse_db::bookmarks::BookmarkRow> for BookmarkItem {
    fn from(row: venturepulse_db::bookmarks::BookmarkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateBookmarkBody {
    title: String,
    url: String,
    notes: Option<String>,
}

pub(super) async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<BookmarkItem>>>, ApiError> {
    let rows = venturepulse_db::bookmarks::list_bookmarks(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(BookmarkItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_bookmark(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateBookmarkBody>,
) -> Result<Json<ApiResponse<BookmarkItem>>, ApiError> {
    if body.title.trim().is_empty() || body.url.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "title and url are required",
        ));
    }

    let row = venturepulse_db::bookmarks::create_bookmark(
        &state.pool,
        user.id,
        body.title.trim(),
        body.url.trim(),
        body.notes.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_bookmark(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(bookmark_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    venturepulse_db::bookmarks::delete_bookmark(&state.pool, bookmark_id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: (),
        meta: ResponseMeta::new(req_id.0),
    }))
}
