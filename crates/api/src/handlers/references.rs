//! Handlers for snapshot-bound references: bind, list, resolve, sync,
//! unlink.
//!
//! A reference is always resolved *as of* its bound version; the
//! referenced resource's later commits are invisible to the dependent
//! until an explicit sync. Freshness is recomputed on every read, never
//! stored.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use testbed_core::error::CoreError;
use testbed_core::plugin;
use testbed_core::types::{DbId, ResourceKind};
use testbed_core::versioning::{self, ReferenceStatus};
use testbed_db::models::reference::{CreateReference, ResourceReference};
use testbed_db::models::resource::Resource;
use testbed_db::models::snapshot::Snapshot;
use testbed_db::repositories::{ReferenceRepo, ResourceRepo, SnapshotRepo};
use testbed_events::ResourceEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::resources::{find_resource, parse_kind};
use crate::response::{DataResponse, DataWithWarning, Warning};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A reference enriched with its derived status, for listings.
#[derive(Debug, Serialize)]
pub struct ReferenceView {
    #[serde(flatten)]
    pub reference: ResourceReference,
    pub status: ReferenceStatus,
}

/// A reference together with the snapshot content it resolves to.
#[derive(Debug, Serialize)]
pub struct ResolvedReference {
    #[serde(flatten)]
    pub reference: ResourceReference,
    pub status: ReferenceStatus,
    /// The referenced resource's content as of the bound version.
    pub resolved: Snapshot,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load a reference by id, scoped to its dependent, or fail with 404.
async fn find_reference(
    pool: &testbed_db::DbPool,
    dependent_id: DbId,
    ref_id: DbId,
) -> Result<ResourceReference, AppError> {
    ReferenceRepo::find_for_dependent(pool, dependent_id, ref_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Reference",
            id: ref_id,
        }))
}

/// Load the referenced resource's current state, or fail with the
/// dangling-reference error that marks the edge as broken.
async fn find_target(
    pool: &testbed_db::DbPool,
    reference: &ResourceReference,
) -> Result<Resource, AppError> {
    ResourceRepo::find_any_kind(pool, reference.referenced_id)
        .await?
        .ok_or(AppError::Core(CoreError::DanglingReference {
            entity: entity_label_for_token(&reference.referenced_kind),
            id: reference.referenced_id,
        }))
}

/// Best-effort entity label for a stored kind token.
fn entity_label_for_token(token: &str) -> &'static str {
    ResourceKind::from_str_token(token)
        .map(|k| k.entity_label())
        .unwrap_or("Resource")
}

/// Load the snapshot a reference is bound to. Under the append-only
/// invariant this can only be absent if history was tampered with.
async fn load_bound_snapshot(
    pool: &testbed_db::DbPool,
    resource_id: DbId,
    version: i64,
) -> Result<Snapshot, AppError> {
    SnapshotRepo::find_by_version(pool, resource_id, version)
        .await?
        .ok_or_else(|| {
            AppError::InternalError(format!(
                "snapshot history for resource {resource_id} is missing version {version}"
            ))
        })
}

// ---------------------------------------------------------------------------
// Bind
// ---------------------------------------------------------------------------

/// POST /api/v1/{resource_type}/{id}/references
///
/// Bind a reference to the referenced resource's *current* snapshot and
/// return the resolved content. A sub-selection must exist in the current
/// payload at bind time.
pub async fn bind_reference(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
    Json(input): Json<CreateReference>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let dependent = find_resource(&state.pool, kind, id).await?;

    let target = find_resource(&state.pool, input.referenced_kind, input.referenced_id).await?;

    if let Some(selection) = &input.sub_selection {
        if !plugin::has_task(&target.payload, selection) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Task '{selection}' does not exist in {} '{}'",
                input.referenced_kind.entity_label(),
                target.name
            ))));
        }
    }

    let reference = ReferenceRepo::create(
        &state.pool,
        dependent.id,
        input.referenced_kind,
        target.id,
        target.snapshot_id,
        input.sub_selection.as_deref(),
    )
    .await?;

    let resolved = load_bound_snapshot(&state.pool, target.id, reference.bound_version).await?;
    tracing::info!(
        dependent_id = dependent.id,
        referenced_id = target.id,
        bound_version = reference.bound_version,
        "Reference bound",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ResolvedReference {
                reference,
                status: ReferenceStatus::Fresh,
                resolved,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}/{id}/references
///
/// List the dependent's references with their derived status. Staleness
/// and brokenness are recomputed here on every read.
pub async fn list_references(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let dependent = find_resource(&state.pool, kind, id).await?;

    let references = ReferenceRepo::list_by_dependent(&state.pool, dependent.id).await?;

    let mut views = Vec::with_capacity(references.len());
    for reference in references {
        let target = ResourceRepo::find_any_kind(&state.pool, reference.referenced_id).await?;
        let status = versioning::reference_status(
            reference.bound_version,
            target.map(|t| t.snapshot_id),
        );
        views.push(ReferenceView { reference, status });
    }

    Ok(Json(DataResponse { data: views }))
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}/{id}/references/{ref_id}
///
/// Resolve the reference *as of* its bound version. Later commits of the
/// referenced resource do not change this answer; deletion of the
/// referenced identity makes it fail as dangling.
pub async fn resolve_reference(
    State(state): State<AppState>,
    Path((resource_type, id, ref_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let dependent = find_resource(&state.pool, kind, id).await?;
    let reference = find_reference(&state.pool, dependent.id, ref_id).await?;

    let target = find_target(&state.pool, &reference).await?;
    let resolved = load_bound_snapshot(&state.pool, target.id, reference.bound_version).await?;
    let status = versioning::reference_status(reference.bound_version, Some(target.snapshot_id));

    Ok(Json(DataResponse {
        data: ResolvedReference {
            reference,
            status,
            resolved,
        },
    }))
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// POST /api/v1/{resource_type}/{id}/references/{ref_id}/sync
///
/// Re-bind the reference to the referenced resource's current latest
/// snapshot. A sub-selection that no longer exists there is cleared and
/// reported as a non-fatal warning.
pub async fn sync_reference(
    State(state): State<AppState>,
    Path((resource_type, id, ref_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let dependent = find_resource(&state.pool, kind, id).await?;
    let reference = find_reference(&state.pool, dependent.id, ref_id).await?;

    let target = find_target(&state.pool, &reference).await?;
    let plan = versioning::plan_sync(
        target.snapshot_id,
        &target.payload,
        reference.sub_selection.as_deref(),
    );

    let synced = ReferenceRepo::rebind(
        &state.pool,
        reference.id,
        plan.bound_version,
        plan.sub_selection.as_deref(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Reference",
        id: ref_id,
    }))?;

    let resolved = load_bound_snapshot(&state.pool, target.id, synced.bound_version).await?;

    state.event_bus.publish(
        ResourceEvent::new("reference.synced")
            .with_resource(kind.as_str(), dependent.id)
            .with_payload(json!({
                "reference_id": synced.id,
                "bound_version": synced.bound_version,
            })),
    );
    tracing::info!(
        dependent_id = dependent.id,
        reference_id = synced.id,
        bound_version = synced.bound_version,
        sub_selection_lost = plan.lost.is_some(),
        "Reference synced",
    );

    let warning = plan.lost.map(|lost| Warning {
        code: "sub_selection_lost",
        message: lost.message(),
    });

    Ok(Json(DataWithWarning {
        data: ResolvedReference {
            reference: synced,
            status: ReferenceStatus::Fresh,
            resolved,
        },
        warning,
    }))
}

// ---------------------------------------------------------------------------
// Unlink
// ---------------------------------------------------------------------------

/// DELETE /api/v1/{resource_type}/{id}/references/{ref_id}
pub async fn unlink_reference(
    State(state): State<AppState>,
    Path((resource_type, id, ref_id)): Path<(String, DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let dependent = find_resource(&state.pool, kind, id).await?;

    let deleted = ReferenceRepo::delete(&state.pool, dependent.id, ref_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Reference",
            id: ref_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}
