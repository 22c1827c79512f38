use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use snip_core::{Link, ShortCode, ShortenedLink};

use crate::auth::UserId;
use crate::error::{AppError, Result};
use crate::model::{BatchShortenItem, ShortenRequest, ShortenResponse};
use crate::state::AppState;

fn status_for(links: &[ShortenedLink]) -> StatusCode {
    if links.iter().all(|link| link.saved) {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

async fn shorten_one(state: &AppState, url: String, user: &UserId) -> Result<ShortenedLink> {
    let mut links = state
        .shortener()
        .shorten(vec![Link::new(url)], state.base_url(), user.as_str())
        .await?;

    links
        .pop()
        .ok_or_else(|| AppError::Internal("empty response from shortener".into()))
}

/// `POST /` with the URL as a plain-text body.
pub async fn shorten_plain_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    body: String,
) -> Result<Response> {
    if body.is_empty() {
        return Err(AppError::bad_request("URL is required"));
    }

    let link = shorten_one(&state, body, &user).await?;
    let status = status_for(std::slice::from_ref(&link));
    Ok((status, link.short_url).into_response())
}

/// `POST /api/shorten` with `{"url": "..."}`.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|_| AppError::bad_request("Invalid JSON payload"))?;
    if request.url.is_empty() {
        return Err(AppError::bad_request("URL is required"));
    }

    let link = shorten_one(&state, request.url, &user).await?;
    let status = status_for(std::slice::from_ref(&link));
    Ok((
        status,
        Json(ShortenResponse {
            result: link.short_url,
        }),
    )
        .into_response())
}

/// `POST /api/shorten/batch` with a list of URLs tagged by correlation id.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    payload: std::result::Result<Json<Vec<BatchShortenItem>>, JsonRejection>,
) -> Result<Response> {
    let Json(items) = payload.map_err(|_| AppError::bad_request("Invalid JSON payload"))?;
    if items.is_empty() {
        return Err(AppError::bad_request("URLs are required"));
    }
    if items.iter().any(|item| item.original_url.is_empty()) {
        return Err(AppError::bad_request("URL is required"));
    }

    let links = items
        .into_iter()
        .map(|item| Link::new(item.original_url).with_correlation_id(item.correlation_id))
        .collect();
    let shortened = state
        .shortener()
        .shorten(links, state.base_url(), user.as_str())
        .await?;

    Ok((status_for(&shortened), Json(shortened)).into_response())
}

/// `GET /{hash}` redirects to the original URL.
pub async fn redirect_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let url = state
        .shortener()
        .resolve(&ShortCode::new_unchecked(hash))
        .await?;

    Ok(Redirect::temporary(&url))
}
