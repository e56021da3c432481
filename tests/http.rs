//! HTTP contract: status codes and bodies of the REST surface, over in-memory backends.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use homescreen_cms::blob::{file_key, MemoryBlobStorage};
use homescreen_cms::store::MemoryStore;
use homescreen_cms::{app, AppState, Models, SharedBlobs, SharedStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn test_app() -> Router {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let models = Models::init(store.clone()).await.unwrap();
    let blobs: SharedBlobs = Arc::new(MemoryBlobStorage::new("media", Duration::from_secs(60)));
    app(AppState::new(store, &models, blobs, 1024 * 1024))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_readiness() {
    let app = test_app().await;
    assert_eq!(send(&app, Method::GET, "/health", None).await, (StatusCode::OK, json!({"status": "ok"})));
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");
}

#[tokio::test]
async fn movie_lifecycle() {
    let app = test_app().await;
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/movies",
        Some(json!({"title": "Heat", "description": "Crime", "poster": "heat.jpg", "tags": ["crime"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created.get("_id").is_none());
    assert!(created.get("__v").is_none());
    assert_eq!(created["views"], 0);

    let (status, fetched) = send(&app, Method::GET, &format!("/api/movies/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Heat");

    let (status, patched) = send(&app, Method::PATCH, &format!("/api/movies/{}", id), Some(json!({"views": 7}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["views"], 7);
    assert_eq!(patched["title"], "Heat");

    let (status, put) = send(&app, Method::PUT, &format!("/api/movies/{}", id), Some(json!({"title": "Heat (1995)"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(put["title"], "Heat (1995)");

    let (status, listed) = send(&app, Method::GET, "/api/movies?title_like=heat&_sort=title&_order=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, Method::GET, "/api/movies?tags_in=drama", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));

    let (status, deleted) = send(&app, Method::DELETE, &format!("/api/movies/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"id": id}));

    let (status, body) = send(&app, Method::GET, &format!("/api/movies/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Movie not found"}));
}

#[tokio::test]
async fn rejects_bad_bodies() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::POST, "/api/sections", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "body must be a JSON object");

    let (status, body) = send(&app, Method::POST, "/api/sections", Some(json!({"title": "x", "type": "Carousel"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::DELETE, "/api/sections/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Section not found");
}

#[tokio::test]
async fn active_screen_flow() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/screen", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "No active screen configuration found. Please set one using /api/screen/set"
    );

    let (status, body) = send(&app, Method::POST, "/api/screen/set", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Configuration ID is required in request body");

    let (status, body) = send(&app, Method::POST, "/api/screen/set", Some(json!({"id": "missing"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Screen configuration not found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/screen-configurations/set-active",
        Some(json!({"id": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ScreenConfiguration not found");

    let (_, movie) = send(
        &app,
        Method::POST,
        "/api/movies",
        Some(json!({"title": "Heat", "description": "d", "poster": "p"})),
    )
    .await;
    let (_, section) = send(
        &app,
        Method::POST,
        "/api/sections",
        Some(json!({"title": "Hero", "type": "HeroSlider", "items": [movie["id"]]})),
    )
    .await;
    let (_, config) = send(
        &app,
        Method::POST,
        "/api/screen-configurations",
        Some(json!({"name": "Home", "sections": [section["id"]]})),
    )
    .await;

    let (status, body) = send(&app, Method::POST, "/api/screen/set", Some(json!({"id": config["id"]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": config["id"], "name": "Home"}));

    let (status, screen) = send(&app, Method::GET, "/api/screen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(screen["id"], config["id"]);
    assert_eq!(screen["sections"][0]["title"], "Hero");
    assert_eq!(screen["sections"][0]["items"][0]["title"], "Heat");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/screen-configurations/set-active",
        Some(json!({"id": config["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Home");
}

#[tokio::test]
async fn base64_upload_download_and_delete() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::POST, "/api/s3/upload-base64", Some(json!({"contentType": "image/png"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file data provided");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/s3/upload-base64",
        Some(json!({"file": "data:image/png;base64,aGk=", "contentType": "image/png"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = file_key(b"hi", "png");
    assert_eq!(body["key"], key.as_str());
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], format!("memory://media/{}", key));

    let (status, body) = send(&app, Method::GET, &format!("/api/s3/file/{}", key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], format!("memory://media/{}?expires=60", key));

    let (status, body) = send(&app, Method::DELETE, &format!("/api/s3/file/{}", key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "File deleted successfully", "success": true}));
}

fn multipart_request(field: &str, file_name: &str, content: &str) -> Request<Body> {
    let boundary = "homescreen-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n{content}\r\n--{b}--\r\n",
        b = boundary,
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/s3/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn multipart_upload_uses_the_file_name_extension() {
    let app = test_app().await;
    let response = app
        .clone()
        .oneshot(multipart_request("file", "poster.final.png", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["key"], file_key(b"hello", "png").as_str());

    let response = app
        .clone()
        .oneshot(multipart_request("attachment", "poster.png", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["error"], "No file provided");
}
