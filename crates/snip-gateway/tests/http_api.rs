use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use snip_core::Repository;
use snip_gateway::{App, AppState, JwtIdentity};
use snip_shortener::ShortenerService;
use snip_storage::{InMemoryRepository, Journal};
use tower::ServiceExt;
use tower_http::compression::predicate::SizeAbove;
use tower_http::compression::CompressionLayer;

const BASE_URL: &str = "http://localhost:8080";

fn app_with(repository: InMemoryRepository) -> Router {
    let service = ShortenerService::new(repository);
    App::router(AppState::new(
        Arc::new(service),
        BASE_URL,
        JwtIdentity::new("test-secret"),
    ))
}

fn app() -> Router {
    app_with(InMemoryRepository::new())
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Returns the `auth=<token>` pair set by the response.
fn auth_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_owned)
}

fn post_plain(url: &str) -> Request<Body> {
    Request::post("/").body(Body::from(url.to_owned())).unwrap()
}

fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn ping_reports_ok() {
    let response = send(&app(), Request::get("/ping").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn shorten_plain_then_conflict() {
    let app = app();

    let response = send(&app, post_plain("https://google.com")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_string(response).await, "http://localhost:8080/05046f");

    let response = send(&app, post_plain("https://google.com")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_string(response).await, "http://localhost:8080/05046f");
}

/// Gzips `text` by serving it through the compression layer.
async fn gzip(text: &'static str) -> Vec<u8> {
    let compressor = Router::new()
        .route("/", get(move || async move { text }))
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .compress_when(SizeAbove::new(0)),
        );

    let response = compressor
        .oneshot(
            Request::get("/")
                .header(header::ACCEPT_ENCODING, "gzip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::CONTENT_ENCODING).unwrap(),
        "gzip"
    );
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn shorten_plain_accepts_gzipped_body() {
    let body = gzip("https://google.com").await;

    let response = send(
        &app(),
        Request::post("/")
            .header(header::CONTENT_ENCODING, "gzip")
            .body(Body::from(body))
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_string(response).await, "http://localhost:8080/05046f");
}

#[tokio::test]
async fn shorten_plain_rejects_empty_body() {
    let response = send(&app(), post_plain("")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shorten_json() {
    let app = app();

    let response = send(
        &app,
        post_json("/api/shorten", json!({"url": "https://x.com/"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!({"result": "http://localhost:8080/326a64"})
    );

    let response = send(
        &app,
        post_json("/api/shorten", json!({"url": "https://x.com/"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn shorten_json_rejects_bad_payloads() {
    let app = app();

    for body in [json!({"url": ""}), json!({"link": "https://x.com/"}), json!([1, 2])] {
        let response = send(&app, post_json("/api/shorten", body, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    let response = send(
        &app,
        Request::post("/api/shorten")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shorten_batch_keeps_order() {
    let app = app();
    let batch = json!([
        {"correlation_id": "x", "original_url": "https://x.com/"},
        {"correlation_id": "t", "original_url": "https://t.me/"},
    ]);

    let response = send(&app, post_json("/api/shorten/batch", batch.clone(), None)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        json!([
            {"correlation_id": "x", "short_url": "http://localhost:8080/326a64"},
            {"correlation_id": "t", "short_url": "http://localhost:8080/e70e7a"},
        ])
    );

    let response = send(&app, post_json("/api/shorten/batch", batch, None)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn shorten_batch_rejects_empty() {
    let app = app();

    let response = send(&app, post_json("/api/shorten/batch", json!([]), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        post_json(
            "/api/shorten/batch",
            json!([{"correlation_id": "1", "original_url": ""}]),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redirect_to_original() {
    let app = app();
    send(&app, post_plain("https://google.com")).await;

    let response = send(&app, Request::get("/05046f").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://google.com"
    );
}

#[tokio::test]
async fn redirect_unknown_is_not_found() {
    let response = send(&app(), Request::get("/abcdef").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn redirect_deleted_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");
    let line = r#"{"hash":"05046f","original_url":"https://google.com","correlation_id":"","user_id":"alice","is_deleted":true}"#;
    tokio::fs::write(&path, format!("{line}\n")).await.unwrap();

    let repository = InMemoryRepository::with_journal(Journal::open(&path).await.unwrap());
    repository.init().await.unwrap();

    let response = send(
        &app_with(repository),
        Request::get("/05046f").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn identity_cookie_scopes_user_urls() {
    let app = app();

    let response = send(
        &app,
        post_json("/api/shorten", json!({"url": "https://x.com/"}), None),
    )
    .await;
    let cookie = auth_cookie(&response).expect("identity cookie");
    assert!(cookie.starts_with("auth="));

    let response = send(
        &app,
        Request::get("/api/user/urls")
            .header(header::COOKIE, cookie.as_str())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(auth_cookie(&response).is_none());
    assert_eq!(
        body_json(response).await,
        json!([{"original_url": "https://x.com/", "short_url": "http://localhost:8080/326a64"}])
    );

    let response = send(
        &app,
        Request::get("/api/user/urls").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(auth_cookie(&response).is_some());
}

#[tokio::test]
async fn forged_cookie_gets_new_identity() {
    let app = app();
    let forged = format!("auth={}", JwtIdentity::new("other").issue("alice").unwrap());

    let response = send(
        &app,
        Request::get("/api/user/urls")
            .header(header::COOKIE, forged.as_str())
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = auth_cookie(&response).unwrap();
    assert_ne!(cookie, forged);
}

#[tokio::test]
async fn delete_user_urls_is_accepted() {
    let app = app();

    let response = send(
        &app,
        Request::delete("/api/user/urls")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!(["05046f", "326a64"]).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = send(
        &app,
        Request::delete("/api/user/urls")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("[]"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_are_gzipped_on_request() {
    let app = app();
    let response = send(
        &app,
        post_json(
            "/api/shorten/batch",
            json!([
                {"correlation_id": "x", "original_url": "https://x.com/"},
                {"correlation_id": "t", "original_url": "https://t.me/"},
            ]),
            None,
        ),
    )
    .await;
    let cookie = auth_cookie(&response).unwrap();

    let response = send(
        &app,
        Request::get("/api/user/urls")
            .header(header::COOKIE, cookie.as_str())
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_ENCODING).unwrap(),
        "gzip"
    );
}
