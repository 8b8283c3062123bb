//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! All JSON endpoints live under `/api`. `/s/{code}` is the public short
//! link handed out when a list is shared; it redirects browsers to the list
//! page. Handlers stay thin: they extract, call a service and map the
//! service error to a status code.

pub mod items;
pub mod links;
pub mod lists;
pub mod short_urls;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/users", post(users::create_user))
        .route("/api/users/{id}", get(users::get_user).patch(users::change_name))
        .route("/api/users/{id}/lists", get(users::user_lists).post(users::create_list))
        .route("/api/users/{id}/lists/{list_id}", delete(users::delete_list))
        .route(
            "/api/users/{id}/saved-lists/{list_id}",
            post(users::save_list).delete(users::unsave_list),
        )
        .route("/api/lists", get(lists::lists_by_ids))
        .route("/api/lists/{id}", get(lists::get_list).put(lists::put_list))
        .route("/api/lists/{id}/short-url", post(lists::share_list))
        .route("/api/lists/{id}/suggestions", post(lists::suggestions))
        .route("/api/lists/{id}/items", post(items::add_item))
        .route("/api/lists/{id}/shared-items", post(items::add_shared_item))
        .route("/api/lists/{id}/items/{index}", put(items::update_item).delete(items::delete_item))
        .route("/api/lists/{id}/items/{index}/purchased", post(items::toggle_purchased))
        .route("/api/lists/{id}/items/{index}/move", post(items::move_item))
        .route("/api/lists/{id}/items/{index}/copy", post(items::copy_item))
        .route("/api/short-urls/{code}", get(short_urls::resolve))
        .route("/api/links/affiliate", post(links::affiliate))
        .route("/s/{code}", get(short_urls::redirect))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
