//! Handlers for resource CRUD: list, create, get, commit, delete.
//!
//! A create is the first commit (version 1); a PUT is a commit that
//! appends the next snapshot and moves the resource's current state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use testbed_core::error::CoreError;
use testbed_core::identifier;
use testbed_core::types::{DbId, ResourceKind};
use testbed_db::models::resource::{CommitFields, CreateResource, Resource, UpdateResource};
use testbed_db::repositories::{clamp_limit, clamp_offset, ResourceRepo};
use testbed_db::DbPool;
use testbed_events::ResourceEvent;

use crate::error::{AppError, AppResult};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Parse the `{resource_type}` path segment into a [`ResourceKind`].
///
/// Unknown segments read as 404 rather than 400: the collection simply
/// does not exist.
pub fn parse_kind(segment: &str) -> Result<ResourceKind, AppError> {
    ResourceKind::from_path_segment(segment)
        .ok_or_else(|| AppError::UnknownResourceType(segment.to_string()))
}

/// Load a resource of the given kind or fail with 404.
pub async fn find_resource(
    pool: &DbPool,
    kind: ResourceKind,
    id: DbId,
) -> Result<Resource, AppError> {
    ResourceRepo::find_by_id(pool, kind, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: kind.entity_label(),
            id,
        }))
}

/// Validate name/description rules for a kind. Plugin-like kinds also
/// require identifier syntax on the name.
pub fn validate_fields(
    kind: ResourceKind,
    name: &str,
    description: Option<&str>,
) -> Result<(), AppError> {
    identifier::validate_name(name)?;
    identifier::validate_description(description)?;
    if kind.requires_identifier_name() {
        identifier::validate_identifier(name)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}
///
/// Paginated listing, newest-first, optionally narrowed to one group.
/// Entries carry the current `snapshot_id` and the derived `has_draft`.
pub async fn list_resources(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;

    let resources = ResourceRepo::list(
        &state.pool,
        kind,
        params.group,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;

    Ok(Json(DataResponse { data: resources }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/v1/{resource_type}
///
/// Create a resource; this is commit number one.
pub async fn create_resource(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    Json(input): Json<CreateResource>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    validate_fields(kind, &input.name, input.description.as_deref())?;

    let resource = ResourceRepo::create(&state.pool, kind, &input).await?;

    state.event_bus.publish(
        ResourceEvent::new("resource.created")
            .with_resource(kind.as_str(), resource.id)
            .with_payload(json!({ "version": resource.snapshot_id })),
    );
    tracing::info!(kind = kind.as_str(), id = resource.id, "Resource created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/{resource_type}/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let resource = find_resource(&state.pool, kind, id).await?;

    Ok(Json(DataResponse { data: resource }))
}

// ---------------------------------------------------------------------------
// Commit update
// ---------------------------------------------------------------------------

/// PUT /api/v1/{resource_type}/{id}
///
/// Commit an update. Omitted fields keep their current value; the commit
/// appends a new snapshot even when nothing changed (callers needing
/// idempotence must deduplicate at a higher layer).
pub async fn commit_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
    Json(input): Json<UpdateResource>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let current = find_resource(&state.pool, kind, id).await?;

    let fields = CommitFields {
        name: input.name.unwrap_or(current.name),
        description: input.description.or(current.description),
        payload: input.payload.unwrap_or(current.payload),
    };
    validate_fields(kind, &fields.name, fields.description.as_deref())?;

    let resource = ResourceRepo::commit_update(&state.pool, kind, id, &fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: kind.entity_label(),
            id,
        }))?;

    state.event_bus.publish(
        ResourceEvent::new("resource.committed")
            .with_resource(kind.as_str(), resource.id)
            .with_payload(json!({ "version": resource.snapshot_id })),
    );
    tracing::info!(
        kind = kind.as_str(),
        id = resource.id,
        version = resource.snapshot_id,
        "Resource committed",
    );

    Ok(Json(DataResponse { data: resource }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/{resource_type}/{id}
///
/// Remove the resource identity and its entire snapshot history. Inbound
/// references from other resources become dangling.
pub async fn delete_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;

    let deleted = ResourceRepo::delete(&state.pool, kind, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: kind.entity_label(),
            id,
        }));
    }

    state
        .event_bus
        .publish(ResourceEvent::new("resource.deleted").with_resource(kind.as_str(), id));
    tracing::info!(kind = kind.as_str(), id, "Resource deleted");

    Ok(StatusCode::NO_CONTENT)
}
