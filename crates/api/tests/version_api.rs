//! HTTP-level integration tests for version history, compare, restore, and
//! publish endpoints.
//!
//! Exercises the properties the version core guarantees: immutable history,
//! structural diffs, append-only restore, and explicit rejection of
//! restoring the current version.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_empty, post_json};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hero_section(title: &str) -> serde_json::Value {
    json!({
        "sectionKey": "hero",
        "sectionType": "banner",
        "title": title,
        "position": 0,
        "content": {}
    })
}

/// Create a page whose v1 has a single "hero" section, returning its id.
async fn setup_page(app: &axum::Router) -> i64 {
    let body = json!({
        "state": {"title": "Home", "sections": [hero_section("Welcome")]},
        "createdBy": "tests"
    });
    let created = body_json(post_json(app, "/api/v1/pages", body).await).await;
    created["data"]["id"].as_i64().unwrap()
}

/// Append a version: hero title edited and a "cta" section added.
async fn edit_page(app: &axum::Router, id: i64) -> serde_json::Value {
    let body = json!({
        "state": {
            "title": "Home",
            "sections": [
                hero_section("Welcome!"),
                {
                    "sectionKey": "cta",
                    "sectionType": "button",
                    "title": "Sign up",
                    "position": 1,
                    "content": {}
                }
            ]
        },
        "changeDescription": "Punchier hero, added call to action"
    });
    body_json(post_json(app, &format!("/api/v1/pages/{id}/versions"), body).await).await
}

// ---------------------------------------------------------------------------
// Version history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_version_increments_number(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;

    let created = edit_page(&app, id).await;
    assert_eq!(created["data"]["version"], 2);
    assert_eq!(
        created["data"]["change_description"],
        "Punchier hero, added call to action"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_versions_newest_first(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let body = body_json(get(&app, &format!("/api/v1/pages/{id}/versions")).await).await;
    let versions = body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], 2);
    assert_eq!(versions[1]["version"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_specific_version(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let body = body_json(get(&app, &format!("/api/v1/pages/{id}/versions/1")).await).await;
    assert_eq!(body["data"]["version"], 1);
    assert_eq!(body["data"]["state"]["sections"][0]["title"], "Welcome");

    let response = get(&app, &format!("/api/v1/pages/{id}/versions/42")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_compare_reports_page_and_section_changes(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let response = get(&app, &format!("/api/v1/pages/{id}/compare?v1=1&v2=2")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let data = &body["data"];

    assert_eq!(data["version1"]["versionNumber"], 1);
    assert_eq!(data["version2"]["versionNumber"], 2);
    assert_eq!(data["version1"]["createdBy"], "tests");

    // Title unchanged between v1 and v2.
    assert_eq!(data["pageChanges"], json!({}));

    let changes = data["sectionChanges"].as_array().unwrap();
    assert_eq!(changes.len(), 2);

    // Modified hero first (newer snapshot's order), carrying only the
    // changed field.
    assert_eq!(changes[0]["type"], "modified");
    assert_eq!(changes[0]["sectionKey"], "hero");
    assert_eq!(changes[0]["changes"]["title"]["old"], "Welcome");
    assert_eq!(changes[0]["changes"]["title"]["new"], "Welcome!");
    assert!(changes[0]["changes"].get("position").is_none());

    // Added cta second, carrying the full section.
    assert_eq!(changes[1]["type"], "added");
    assert_eq!(changes[1]["sectionKey"], "cta");
    assert_eq!(changes[1]["section"]["title"], "Sign up");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_compare_swapped_arguments_swaps_roles(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let body = body_json(
        get(&app, &format!("/api/v1/pages/{id}/compare?v1=2&v2=1")).await,
    )
    .await;
    let changes = body["data"]["sectionChanges"].as_array().unwrap();

    // cta exists only in v2, so comparing 2 -> 1 reports it as removed.
    let cta = changes
        .iter()
        .find(|c| c["sectionKey"] == "cta")
        .expect("cta change present");
    assert_eq!(cta["type"], "removed");

    let hero = changes
        .iter()
        .find(|c| c["sectionKey"] == "hero")
        .expect("hero change present");
    assert_eq!(hero["changes"]["title"]["old"], "Welcome!");
    assert_eq!(hero["changes"]["title"]["new"], "Welcome");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_compare_version_with_itself_is_empty(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;

    let body = body_json(
        get(&app, &format!("/api/v1/pages/{id}/compare?v1=1&v2=1")).await,
    )
    .await;
    assert_eq!(body["data"]["pageChanges"], json!({}));
    assert_eq!(body["data"]["sectionChanges"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_compare_unknown_version_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;

    let response = get(&app, &format!("/api/v1/pages/{id}/compare?v1=1&v2=9")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_restore_appends_new_version_with_target_state(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let response = post_empty(&app, &format!("/api/v1/pages/{id}/restore/1")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["newVersionNumber"], 3);

    // The restored version is structurally identical to its target.
    let diff = body_json(
        get(&app, &format!("/api/v1/pages/{id}/compare?v1=1&v2=3")).await,
    )
    .await;
    assert_eq!(diff["data"]["pageChanges"], json!({}));
    assert_eq!(diff["data"]["sectionChanges"], json!([]));

    // The restore is attributed to its source version.
    let v3 = body_json(get(&app, &format!("/api/v1/pages/{id}/versions/3")).await).await;
    assert_eq!(v3["data"]["change_description"], "Restored from version 1");

    // The intervening version is untouched.
    let v2 = body_json(get(&app, &format!("/api/v1/pages/{id}/versions/2")).await).await;
    assert_eq!(v2["data"]["state"]["sections"][0]["title"], "Welcome!");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_restore_accepts_caller_description(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let body = json!({"changeDescription": "Roll back launch copy", "createdBy": "editor"});
    let response = post_json(&app, &format!("/api/v1/pages/{id}/restore/1"), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let v3 = body_json(get(&app, &format!("/api/v1/pages/{id}/versions/3")).await).await;
    assert_eq!(v3["data"]["change_description"], "Roll back launch copy");
    assert_eq!(v3["data"]["created_by"], "editor");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_restore_of_current_version_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let response = post_empty(&app, &format!("/api/v1/pages/{id}/restore/2")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["error"], "ALREADY_CURRENT");

    // No version was created by the rejected restore.
    let versions = body_json(get(&app, &format!("/api/v1/pages/{id}/versions")).await).await;
    assert_eq!(versions["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_restore_unknown_version_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;

    let response = post_empty(&app, &format!("/api/v1/pages/{id}/restore/9")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_repeated_restores_each_append_one_version(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    for expected in [3, 4] {
        let response = post_empty(&app, &format!("/api/v1/pages/{id}/restore/1")).await;
        let body = body_json(response).await;
        assert_eq!(body["data"]["newVersionNumber"], expected);
    }

    let versions = body_json(get(&app, &format!("/api/v1/pages/{id}/versions")).await).await;
    assert_eq!(versions["data"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_publish_version(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;
    edit_page(&app, id).await;

    let response = post_empty(&app, &format!("/api/v1/pages/{id}/versions/1/publish")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["is_published"], true);
    assert!(body["data"]["published_at"].is_string());

    // Publishing v2 unpublishes v1.
    post_empty(&app, &format!("/api/v1/pages/{id}/versions/2/publish")).await;
    let v1 = body_json(get(&app, &format!("/api/v1/pages/{id}/versions/1")).await).await;
    assert_eq!(v1["data"]["is_published"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_publish_unknown_version_not_found(pool: PgPool) {
    let app = build_test_app(pool);
    let id = setup_page(&app).await;

    let response = post_empty(&app, &format!("/api/v1/pages/{id}/versions/7/publish")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
