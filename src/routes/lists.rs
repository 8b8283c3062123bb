//! List routes: reads, whole-list saves, sharing and suggestions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::models::{Item, List};
use crate::rate_limit::RateLimitError;
use crate::services::lists::{self, ListError, ListWithCreator};
use crate::services::short_url::{self, ShortUrlError};
use crate::services::suggestions::{self, Suggestion, SuggestionError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IdsQuery {
    /// Comma-separated list ids.
    #[serde(default)]
    pub ids: String,
}

#[derive(Deserialize)]
pub struct PutListBody {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub code: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

fn parse_ids(raw: &str) -> Result<Vec<Uuid>, StatusCode> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Uuid::parse_str(s).map_err(|_| StatusCode::BAD_REQUEST))
        .collect()
}

/// `GET /api/lists?ids=a,b,c`: lists with their creators, in request order.
pub async fn lists_by_ids(
    State(state): State<AppState>,
    Query(query): Query<IdsQuery>,
) -> Result<Json<Vec<ListWithCreator>>, StatusCode> {
    let ids = parse_ids(&query.ids)?;
    Ok(Json(lists::get_lists_with_creators(state.store.as_ref(), &ids).await))
}

/// `GET /api/lists/{id}`
pub async fn get_list(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<List>, StatusCode> {
    lists::get_list(state.store.as_ref(), id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `PUT /api/lists/{id}`: overwrite name and items. Creator and short code
/// are kept from the stored list.
pub async fn put_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PutListBody>,
) -> Result<Json<List>, StatusCode> {
    let store = state.store.as_ref();
    let name = body.name.trim();
    if name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut list = lists::get_list(store, id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    list.name = name.to_string();
    list.items = body.items;

    if !lists::save_list(store, &list).await {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(list))
}

/// `POST /api/lists/{id}/short-url`: return the list's share link,
/// allocating a code on first use.
pub async fn share_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShareResponse>, StatusCode> {
    let code = short_url::create_and_add_short_url(state.store.as_ref(), id)
        .await
        .map_err(short_url_error_to_status)?;
    let base = state.config.public_base_url.as_deref().unwrap_or("");
    Ok(Json(ShareResponse { url: short_url::share_url(base, &code), code }))
}

/// `POST /api/lists/{id}/suggestions`: gift ideas for the list.
pub async fn suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuggestionsResponse>, StatusCode> {
    let list = lists::get_list(state.store.as_ref(), id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let suggestions = suggestions::get_suggestions(
        state.llm.as_deref(),
        &state.rate_limiter,
        &list,
        state.config.suggestion_max_tokens,
    )
    .await
    .map_err(suggestion_error_to_status)?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn list_error_to_status(err: ListError) -> StatusCode {
    match err {
        ListError::InvalidName => StatusCode::BAD_REQUEST,
        ListError::NotFound(_) | ListError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ListError::NotOwner { .. } => StatusCode::FORBIDDEN,
        ListError::ShortUrl(e) => short_url_error_to_status(e),
        ListError::Store(e) => {
            error!(error = %e, "list store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn short_url_error_to_status(err: ShortUrlError) -> StatusCode {
    match err {
        ShortUrlError::ListNotFound(_) => StatusCode::NOT_FOUND,
        ShortUrlError::Exhausted { .. } | ShortUrlError::Store(_) => {
            error!(error = %err, "short url allocation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn suggestion_error_to_status(err: SuggestionError) -> StatusCode {
    match err {
        SuggestionError::EmptyList => StatusCode::BAD_REQUEST,
        SuggestionError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        SuggestionError::RateLimited(e) => rate_limit_error_to_status(e),
        SuggestionError::Llm(e) => {
            error!(error = %e, retryable = e.retryable(), "suggestion request failed");
            StatusCode::BAD_GATEWAY
        }
    }
}

pub(crate) fn rate_limit_error_to_status(err: RateLimitError) -> StatusCode {
    warn!(error = %err, retry_after_secs = err.retry_after().as_secs(), "suggestion request throttled");
    StatusCode::TOO_MANY_REQUESTS
}
