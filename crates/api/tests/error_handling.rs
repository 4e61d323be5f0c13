//! Tests for the error response contract: every failure surfaces a JSON
//! body of the form `{ "error": CODE, "message": ... }`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, build_test_app, get, post_empty, post_json};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_page_returns_not_found_body(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app, "/api/v1/pages/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("999"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_validation_error_body(pool: PgPool) {
    let app = build_test_app(pool);

    let body = json!({"state": {"title": "", "sections": []}});
    let response = post_json(&app, "/api/v1/pages", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("Title"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_malformed_json_is_client_error(pool: PgPool) {
    let app = build_test_app(pool);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/pages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_route_returns_not_found(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get(&app, "/api/v1/widgets").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_restore_on_unknown_page_reports_page_not_version(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_empty(&app, "/api/v1/pages/555/restore/1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Page"));
    assert!(body["message"].as_str().unwrap().contains("555"));
}
