//! Short-link resolution.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Json, Redirect};
use serde::Serialize;
use uuid::Uuid;

use crate::services::short_url;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlTarget {
    pub list_id: Uuid,
}

/// `GET /api/short-urls/{code}`
pub async fn resolve(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ShortUrlTarget>, StatusCode> {
    short_url::check_short_url(state.store.as_ref(), &code)
        .await
        .map(|list_id| Json(ShortUrlTarget { list_id }))
        .ok_or(StatusCode::NOT_FOUND)
}

/// `GET /s/{code}`: send browsers to the list page, or home for unknown codes.
pub async fn redirect(State(state): State<AppState>, Path(code): Path<String>) -> Redirect {
    match short_url::check_short_url(state.store.as_ref(), &code).await {
        Some(list_id) => Redirect::temporary(&format!("/list/{list_id}")),
        None => Redirect::temporary("/"),
    }
}
