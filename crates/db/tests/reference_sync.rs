//! Integration tests for snapshot-bound references: staleness detection,
//! sync, sub-selection loss, and dangling references.

use sqlx::SqlitePool;
use testbed_core::plugin;
use testbed_core::types::ResourceKind;
use testbed_core::versioning::{self, Freshness};
use testbed_db::models::resource::{CommitFields, CreateResource};
use testbed_db::repositories::{ReferenceRepo, ResourceRepo, SnapshotRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_resource(name: &str, payload: serde_json::Value) -> CreateResource {
    CreateResource {
        group_id: 1,
        name: name.to_string(),
        description: None,
        payload,
    }
}

fn fields(name: &str, description: Option<&str>, payload: serde_json::Value) -> CommitFields {
    CommitFields {
        name: name.to_string(),
        description: description.map(str::to_string),
        payload,
    }
}

fn plugin_payload(tasks: &[&str]) -> serde_json::Value {
    let tasks: Vec<serde_json::Value> = tasks
        .iter()
        .map(|name| serde_json::json!({ "name": name, "output_type": "tensor" }))
        .collect();
    serde_json::json!({ "files": [ { "filename": "attacks.py", "tasks": tasks } ] })
}

// ---------------------------------------------------------------------------
// Test: staleness flips at the target's next commit and sync repairs it
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn staleness_flips_at_commit_and_sync_repairs(pool: SqlitePool) {
    // Queue Q at version 1, then edited to version 2 before anything
    // references it.
    let queue = ResourceRepo::create(&pool, ResourceKind::Queue, &new_resource("cpu", serde_json::json!({})))
        .await
        .unwrap();
    let queue = ResourceRepo::commit_update(
        &pool,
        ResourceKind::Queue,
        queue.id,
        &fields("cpu", Some("now described"), serde_json::json!({})),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(queue.snapshot_id, 2);

    // Entrypoint E binds Q at version 2.
    let entrypoint =
        ResourceRepo::create(&pool, ResourceKind::Entrypoint, &new_resource("train", serde_json::json!({})))
            .await
            .unwrap();
    let reference = ReferenceRepo::create(
        &pool,
        entrypoint.id,
        ResourceKind::Queue,
        queue.id,
        queue.snapshot_id,
        None,
    )
    .await
    .unwrap();

    let target = ResourceRepo::find_any_kind(&pool, queue.id).await.unwrap().unwrap();
    assert_eq!(
        versioning::freshness(reference.bound_version, target.snapshot_id),
        Freshness::Fresh
    );

    // Q commits again; the binding goes stale without moving.
    let queue = ResourceRepo::commit_update(
        &pool,
        ResourceKind::Queue,
        queue.id,
        &fields("cpu", Some("re-described"), serde_json::json!({})),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(queue.snapshot_id, 3);

    let reference = ReferenceRepo::find_for_dependent(&pool, entrypoint.id, reference.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reference.bound_version, 2);
    assert_eq!(
        versioning::freshness(reference.bound_version, queue.snapshot_id),
        Freshness::Stale
    );

    // Sync rebinds to the current latest and freshness returns.
    let plan = versioning::plan_sync(queue.snapshot_id, &queue.payload, None);
    let synced = ReferenceRepo::rebind(&pool, reference.id, plan.bound_version, plan.sub_selection.as_deref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.bound_version, 3);
    assert_eq!(
        versioning::freshness(synced.bound_version, queue.snapshot_id),
        Freshness::Fresh
    );
}

// ---------------------------------------------------------------------------
// Test: a removed task survives in history but is lost on sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sub_selection_survives_history_but_is_lost_on_sync(pool: SqlitePool) {
    let plugin = ResourceRepo::create(
        &pool,
        ResourceKind::Plugin,
        &new_resource("attacks", plugin_payload(&["fgsm", "pgd"])),
    )
    .await
    .unwrap();

    let entrypoint =
        ResourceRepo::create(&pool, ResourceKind::Entrypoint, &new_resource("train", serde_json::json!({})))
            .await
            .unwrap();
    let reference = ReferenceRepo::create(
        &pool,
        entrypoint.id,
        ResourceKind::Plugin,
        plugin.id,
        plugin.snapshot_id,
        Some("fgsm"),
    )
    .await
    .unwrap();

    // The plugin drops the selected task in version 2.
    let plugin = ResourceRepo::commit_update(
        &pool,
        ResourceKind::Plugin,
        plugin.id,
        &fields("attacks", None, plugin_payload(&["pgd"])),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(plugin.snapshot_id, 2);

    // Resolution still happens against the bound version: the task is
    // there in the immutable history.
    let bound = SnapshotRepo::find_by_version(&pool, plugin.id, reference.bound_version)
        .await
        .unwrap()
        .unwrap();
    assert!(plugin::has_task(&bound.payload, "fgsm"));

    // Sync clears the selection and reports the loss.
    let plan = versioning::plan_sync(plugin.snapshot_id, &plugin.payload, reference.sub_selection.as_deref());
    let lost = plan.lost.as_ref().expect("selection should be reported lost");
    assert_eq!(lost.selection, "fgsm");

    let synced = ReferenceRepo::rebind(&pool, reference.id, plan.bound_version, plan.sub_selection.as_deref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.bound_version, 2);
    assert_eq!(synced.sub_selection, None);
}

// ---------------------------------------------------------------------------
// Test: a surviving task is carried through sync untouched
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn surviving_sub_selection_is_kept_on_sync(pool: SqlitePool) {
    let plugin = ResourceRepo::create(
        &pool,
        ResourceKind::Plugin,
        &new_resource("attacks", plugin_payload(&["fgsm", "pgd"])),
    )
    .await
    .unwrap();
    let entrypoint =
        ResourceRepo::create(&pool, ResourceKind::Entrypoint, &new_resource("train", serde_json::json!({})))
            .await
            .unwrap();
    let reference = ReferenceRepo::create(
        &pool,
        entrypoint.id,
        ResourceKind::Plugin,
        plugin.id,
        plugin.snapshot_id,
        Some("pgd"),
    )
    .await
    .unwrap();

    let plugin = ResourceRepo::commit_update(
        &pool,
        ResourceKind::Plugin,
        plugin.id,
        &fields("attacks", None, plugin_payload(&["pgd", "carlini_wagner"])),
    )
    .await
    .unwrap()
    .unwrap();

    let plan = versioning::plan_sync(plugin.snapshot_id, &plugin.payload, reference.sub_selection.as_deref());
    assert!(plan.lost.is_none());

    let synced = ReferenceRepo::rebind(&pool, reference.id, plan.bound_version, plan.sub_selection.as_deref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.bound_version, 2);
    assert_eq!(synced.sub_selection.as_deref(), Some("pgd"));
}

// ---------------------------------------------------------------------------
// Test: deleting the referenced resource leaves the edge dangling
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_target_leaves_reference_dangling(pool: SqlitePool) {
    let model = ResourceRepo::create(
        &pool,
        ResourceKind::Model,
        &new_resource("resnet50", serde_json::json!({})),
    )
    .await
    .unwrap();
    let job = ResourceRepo::create(&pool, ResourceKind::Job, &new_resource("eval-run", serde_json::json!({})))
        .await
        .unwrap();
    let reference = ReferenceRepo::create(
        &pool,
        job.id,
        ResourceKind::Model,
        model.id,
        model.snapshot_id,
        None,
    )
    .await
    .unwrap();

    ResourceRepo::delete(&pool, ResourceKind::Model, model.id).await.unwrap();

    // The edge survives; the target identity does not. The caller maps
    // this combination to a dangling-reference failure.
    let edge = ReferenceRepo::find_for_dependent(&pool, job.id, reference.id)
        .await
        .unwrap();
    assert!(edge.is_some());
    let target = ResourceRepo::find_any_kind(&pool, model.id).await.unwrap();
    assert!(target.is_none());
}

// ---------------------------------------------------------------------------
// Test: deleting the dependent removes its outbound edges
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_dependent_removes_its_references(pool: SqlitePool) {
    let queue = ResourceRepo::create(&pool, ResourceKind::Queue, &new_resource("cpu", serde_json::json!({})))
        .await
        .unwrap();
    let job = ResourceRepo::create(&pool, ResourceKind::Job, &new_resource("eval-run", serde_json::json!({})))
        .await
        .unwrap();
    let reference = ReferenceRepo::create(
        &pool,
        job.id,
        ResourceKind::Queue,
        queue.id,
        queue.snapshot_id,
        None,
    )
    .await
    .unwrap();

    ResourceRepo::delete(&pool, ResourceKind::Job, job.id).await.unwrap();

    let edge = ReferenceRepo::find_for_dependent(&pool, job.id, reference.id)
        .await
        .unwrap();
    assert!(edge.is_none());
}
