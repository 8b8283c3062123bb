//! User and per-user list routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::models::{List, User};
use crate::routes::lists::list_error_to_status;
use crate::services::lists::{self, ListWithCreator};
use crate::services::users::{self, UserError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ChangeNameBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateListBody {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UserListsQuery {
    #[serde(default)]
    pub saved: bool,
}

/// `POST /api/users`: find or create the user for an email.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> Result<Json<User>, StatusCode> {
    let user = state
        .users
        .create_user_if_needed(&body.email)
        .await
        .map_err(user_error_to_status)?;
    Ok(Json(user))
}

/// `GET /api/users/{id}`
pub async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>, StatusCode> {
    users::get_user_by_id(state.store.as_ref(), id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `PATCH /api/users/{id}`: change display name.
pub async fn change_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeNameBody>,
) -> Result<Json<User>, StatusCode> {
    let store = state.store.as_ref();
    users::change_name(store, id, &body.name)
        .await
        .map_err(user_error_to_status)?;
    users::get_user_by_id(store, id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `GET /api/users/{id}/lists?saved=bool`: owned or saved lists with creators.
pub async fn user_lists(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserListsQuery>,
) -> Result<Json<Vec<ListWithCreator>>, StatusCode> {
    let store = state.store.as_ref();
    let user = users::get_user_by_id(store, id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let out = if query.saved {
        lists::get_lists_with_creators(store, &user.saved_lists).await
    } else {
        lists::get_lists(store, &user, false)
            .await
            .into_iter()
            .map(|list| ListWithCreator { list, creator: Some(user.clone()) })
            .collect()
    };
    Ok(Json(out))
}

/// `POST /api/users/{id}/lists`: create a list owned by the user.
pub async fn create_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateListBody>,
) -> Result<(StatusCode, Json<List>), StatusCode> {
    let list = lists::add_list(state.store.as_ref(), id, &body.name)
        .await
        .map_err(list_error_to_status)?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// `DELETE /api/users/{id}/lists/{list_id}`: creator-only delete.
pub async fn delete_list(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    lists::delete_list(state.store.as_ref(), id, list_id)
        .await
        .map_err(list_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/users/{id}/saved-lists/{list_id}`
pub async fn save_list(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    lists::add_to_saved_lists(state.store.as_ref(), id, list_id)
        .await
        .map_err(list_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/users/{id}/saved-lists/{list_id}`
pub async fn unsave_list(
    State(state): State<AppState>,
    Path((id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    lists::remove_from_saved_lists(state.store.as_ref(), id, list_id)
        .await
        .map_err(list_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn user_error_to_status(err: UserError) -> StatusCode {
    match err {
        UserError::InvalidEmail | UserError::InvalidName => StatusCode::BAD_REQUEST,
        UserError::NotFound(_) => StatusCode::NOT_FOUND,
        UserError::Store(e) => {
            error!(error = %e, "user store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
