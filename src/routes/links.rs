//! Product link enrichment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;

use crate::services::affiliate::{self, AffiliateError, AffiliateLinks};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AffiliateBody {
    pub url: String,
}

/// `POST /api/links/affiliate`: price-tracking and affiliate links for a
/// product URL. Non-Amazon URLs pass through untouched.
pub async fn affiliate(
    State(state): State<AppState>,
    Json(body): Json<AffiliateBody>,
) -> Result<Json<AffiliateLinks>, StatusCode> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !affiliate::is_amazon_url(url) {
        return Ok(Json(affiliate::links_for(None, url, None)));
    }
    state
        .links
        .resolve(url)
        .await
        .map(Json)
        .map_err(affiliate_error_to_status)
}

pub(crate) fn affiliate_error_to_status(err: AffiliateError) -> StatusCode {
    match err {
        AffiliateError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        AffiliateError::Request(_) => {
            error!(error = %err, "affiliate resolution failed");
            StatusCode::BAD_GATEWAY
        }
        AffiliateError::HttpClientBuild(_) => {
            error!(error = %err, "affiliate resolver unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
