//! Integration tests for the draft lifecycle over HTTP.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, post, post_empty, put};
use serde_json::json;
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_queue(app: axum::Router, name: &str) -> i64 {
    let created = body_json(
        post(app, "/api/v1/queues", json!({ "group_id": 1, "name": name })).await,
    )
    .await;
    created["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Test: open is idempotent (create then return existing)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn open_draft_creates_then_returns_existing(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let id = create_queue(app.clone(), "cpu").await;

    let response = post_empty(app.clone(), &format!("/api/v1/queues/{id}/draft")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let opened = body_json(response).await;
    // Seeded from the resource's current fields.
    assert_eq!(opened["data"]["name"], "cpu");
    assert_eq!(opened["data"]["resource_id"], id);

    // Opening again returns the same draft instead of failing.
    let response = post_empty(app.clone(), &format!("/api/v1/queues/{id}/draft")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reopened = body_json(response).await;
    assert_eq!(reopened["data"]["id"], opened["data"]["id"]);

    // The listing now surfaces has_draft.
    let fetched = body_json(get(app, &format!("/api/v1/queues/{id}")).await).await;
    assert_eq!(fetched["data"]["has_draft"], true);
}

// ---------------------------------------------------------------------------
// Test: draft edits are isolated until published
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn draft_edits_are_invisible_until_published(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let id = create_queue(app.clone(), "cpu").await;

    post_empty(app.clone(), &format!("/api/v1/queues/{id}/draft")).await;
    let response = put(
        app.clone(),
        &format!("/api/v1/queues/{id}/draft"),
        json!({ "description": "pending description" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The committed resource is unchanged: still version 1, no description.
    let fetched = body_json(get(app.clone(), &format!("/api/v1/queues/{id}")).await).await;
    assert_eq!(fetched["data"]["snapshot_id"], 1);
    assert_eq!(fetched["data"]["description"], serde_json::Value::Null);

    // Publish commits exactly one snapshot with the draft's fields.
    let response = post_empty(app.clone(), &format!("/api/v1/queues/{id}/draft/publish")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let published = body_json(response).await;
    assert_eq!(published["data"]["snapshot_id"], 2);
    assert_eq!(published["data"]["description"], "pending description");
    assert_eq!(published["data"]["has_draft"], false);

    // The draft is gone after publishing.
    let response = get(app, &format!("/api/v1/queues/{id}/draft")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: discard leaves the resource exactly as before opening
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn discard_leaves_resource_unchanged(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    let id = create_queue(app.clone(), "cpu").await;

    post_empty(app.clone(), &format!("/api/v1/queues/{id}/draft")).await;
    put(
        app.clone(),
        &format!("/api/v1/queues/{id}/draft"),
        json!({ "name": "renamed", "description": "scribbles" }),
    )
    .await;

    let response = delete(app.clone(), &format!("/api/v1/queues/{id}/draft")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let fetched = body_json(get(app.clone(), &format!("/api/v1/queues/{id}")).await).await;
    assert_eq!(fetched["data"]["name"], "cpu");
    assert_eq!(fetched["data"]["snapshot_id"], 1);
    assert_eq!(fetched["data"]["has_draft"], false);

    let history = body_json(get(app, &format!("/api/v1/queues/{id}/snapshots")).await).await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: new-resource draft publishes into a version-1 resource
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_resource_draft_full_lifecycle(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = post(
        app.clone(),
        "/api/v1/queues/drafts",
        json!({ "group_id": 1, "name": "nightly" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let draft = body_json(response).await;
    assert_eq!(draft["data"]["resource_id"], serde_json::Value::Null);
    let draft_id = draft["data"]["id"].as_i64().unwrap();

    let listed = body_json(get(app.clone(), "/api/v1/queues/drafts").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    put(
        app.clone(),
        &format!("/api/v1/queues/drafts/{draft_id}"),
        json!({ "description": "runs after midnight" }),
    )
    .await;

    let response =
        post_empty(app.clone(), &format!("/api/v1/queues/drafts/{draft_id}/publish")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let resource = body_json(response).await;
    assert_eq!(resource["data"]["snapshot_id"], 1);
    assert_eq!(resource["data"]["name"], "nightly");
    assert_eq!(resource["data"]["description"], "runs after midnight");

    // The draft is consumed by publishing.
    let response = get(app, &format!("/api/v1/queues/drafts/{draft_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: a new-resource draft is invisible under another kind
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_draft_is_scoped_to_its_kind(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let draft = body_json(
        post(app.clone(), "/api/v1/queues/drafts", json!({ "group_id": 1, "name": "nightly" }))
            .await,
    )
    .await;
    let draft_id = draft["data"]["id"].as_i64().unwrap();

    let response = get(app, &format!("/api/v1/experiments/drafts/{draft_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
