use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// Reports whether the storage backend is reachable.
pub async fn ping_handler(State(state): State<AppState>) -> StatusCode {
    match state.shortener().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
