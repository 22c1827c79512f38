use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use snip_core::ShortCode;

use crate::auth::UserId;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `GET /api/user/urls` lists the caller's live links.
pub async fn user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
) -> Result<Response> {
    let links = state
        .shortener()
        .user_links(state.base_url(), user.as_str())
        .await?;

    if links.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(links).into_response())
}

/// `DELETE /api/user/urls` with a list of short codes.
///
/// Deletion is applied in the background; the response only confirms the
/// request was queued.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<Vec<String>>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(hashes) = payload.map_err(|_| AppError::bad_request("Invalid JSON payload"))?;
    if hashes.is_empty() {
        return Err(AppError::bad_request("Hashes are required"));
    }

    let codes = hashes.into_iter().map(ShortCode::new_unchecked).collect();
    state
        .shortener()
        .delete_user_links(codes, user.as_str())
        .await?;

    Ok(StatusCode::ACCEPTED)
}
