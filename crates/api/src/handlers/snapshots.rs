//! Handlers for snapshot history reads.
//!
//! Snapshots are immutable; both endpoints are idempotent reads.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use testbed_core::error::CoreError;
use testbed_core::types::{DbId, Version};
use testbed_core::versioning;
use testbed_db::models::snapshot::Snapshot;
use testbed_db::repositories::{clamp_limit, clamp_offset, SnapshotRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::resources::{find_resource, parse_kind};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A snapshot enriched with the derived `latest_snapshot` flag.
///
/// Exactly one entry per resource carries `latest_snapshot: true`, and its
/// version equals the resource's current `snapshot_id`.
#[derive(Debug, Serialize)]
pub struct SnapshotView {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub latest_snapshot: bool,
}

// ---------------------------------------------------------------------------
// List history
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}/{id}/snapshots
///
/// List a resource's version history, newest first.
pub async fn list_snapshots(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let resource = find_resource(&state.pool, kind, id).await?;

    let history = SnapshotRepo::list_history(
        &state.pool,
        id,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;

    let views: Vec<SnapshotView> = history
        .into_iter()
        .map(|snapshot| SnapshotView {
            latest_snapshot: versioning::is_latest(snapshot.version, resource.snapshot_id),
            snapshot,
        })
        .collect();

    Ok(Json(DataResponse { data: views }))
}

// ---------------------------------------------------------------------------
// Get one version
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}/{id}/snapshots/{version}
///
/// Immutable historical content of one version.
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path((resource_type, id, version)): Path<(String, DbId, Version)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let resource = find_resource(&state.pool, kind, id).await?;

    let snapshot = SnapshotRepo::find_by_version(&state.pool, id, version)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Snapshot",
            id: version,
        }))?;

    Ok(Json(DataResponse {
        data: SnapshotView {
            latest_snapshot: versioning::is_latest(snapshot.version, resource.snapshot_id),
            snapshot,
        },
    }))
}
