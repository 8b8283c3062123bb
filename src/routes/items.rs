//! Item routes. Items are addressed by their position in the list and
//! every handler responds with the list as saved.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::models::{List, MoveDirection};
use crate::services::items::{self, ItemDraft, ItemError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MoveBody {
    pub direction: MoveDirection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyBody {
    pub target_list_id: Uuid,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SharedItemBody {
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
}

/// `POST /api/lists/{id}/items`
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ItemDraft>,
) -> Result<(StatusCode, Json<List>), StatusCode> {
    let list = items::add_item(state.store.as_ref(), state.links.as_ref(), id, draft)
        .await
        .map_err(item_error_to_status)?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// `POST /api/lists/{id}/shared-items`: share-sheet intake.
pub async fn add_shared_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SharedItemBody>,
) -> Result<(StatusCode, Json<List>), StatusCode> {
    let draft = items::item_from_share(body.title.as_deref(), body.text.as_deref(), body.url.as_deref())
        .map_err(item_error_to_status)?;
    add_item(State(state), Path(id), Json(draft)).await
}

/// `PUT /api/lists/{id}/items/{index}`
pub async fn update_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(draft): Json<ItemDraft>,
) -> Result<Json<List>, StatusCode> {
    items::update_item(state.store.as_ref(), state.links.as_ref(), id, index, draft)
        .await
        .map(Json)
        .map_err(item_error_to_status)
}

/// `DELETE /api/lists/{id}/items/{index}`
pub async fn delete_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<List>, StatusCode> {
    items::delete_item(state.store.as_ref(), id, index)
        .await
        .map(Json)
        .map_err(item_error_to_status)
}

/// `POST /api/lists/{id}/items/{index}/purchased`: flip the purchased flag.
pub async fn toggle_purchased(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<List>, StatusCode> {
    items::toggle_purchased(state.store.as_ref(), id, index)
        .await
        .map(Json)
        .map_err(item_error_to_status)
}

/// `POST /api/lists/{id}/items/{index}/move`
pub async fn move_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(body): Json<MoveBody>,
) -> Result<Json<List>, StatusCode> {
    items::move_item(state.store.as_ref(), id, index, body.direction)
        .await
        .map(Json)
        .map_err(item_error_to_status)
}

/// `POST /api/lists/{id}/items/{index}/copy`: responds with the target list.
pub async fn copy_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(body): Json<CopyBody>,
) -> Result<Json<List>, StatusCode> {
    items::copy_item(state.store.as_ref(), id, index, body.target_list_id)
        .await
        .map(Json)
        .map_err(item_error_to_status)
}

pub(crate) fn item_error_to_status(err: ItemError) -> StatusCode {
    match err {
        ItemError::InvalidName | ItemError::InvalidUrl | ItemError::EmptyShare => StatusCode::BAD_REQUEST,
        ItemError::ListNotFound(_) | ItemError::Index(_) => StatusCode::NOT_FOUND,
        ItemError::Enrichment(e) => {
            error!(error = %e, "item link enrichment failed");
            StatusCode::BAD_GATEWAY
        }
        ItemError::SaveFailed(list_id) => {
            error!(%list_id, "item change not saved");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
