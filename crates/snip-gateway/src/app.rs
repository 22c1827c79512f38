use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth::identify;
use crate::handlers::{
    delete_user_urls_handler, ping_handler, redirect_handler, shorten_batch_handler,
    shorten_json_handler, shorten_plain_handler, user_urls_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/ping", get(ping_handler))
            .route("/", post(shorten_plain_handler))
            .route("/{hash}", get(redirect_handler))
            .nest(
                "/api",
                Router::new()
                    .route("/shorten", post(shorten_json_handler))
                    .route("/shorten/batch", post(shorten_batch_handler))
                    .route(
                        "/user/urls",
                        get(user_urls_handler).delete(delete_user_urls_handler),
                    ),
            )
            .layer(middleware::from_fn_with_state(state.clone(), identify))
            .layer(RequestDecompressionLayer::new().gzip(true))
            .layer(CompressionLayer::new().gzip(true))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
