//! Handlers for the draft lifecycle.
//!
//! Two flavours share the machinery:
//! - pending-edit drafts, scoped to an existing resource (`/{id}/draft`)
//! - new-resource drafts, not yet attached to an identity (`/drafts`)
//!
//! A draft never touches the committed resource until it is published;
//! publishing commits exactly one snapshot and removes the draft.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use testbed_core::error::CoreError;
use testbed_core::types::{DbId, ResourceKind};
use testbed_db::models::draft::{CreateDraft, Draft, UpdateDraft};
use testbed_db::models::resource::CommitFields;
use testbed_db::repositories::{clamp_limit, clamp_offset, DraftRepo};
use testbed_events::ResourceEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::resources::{find_resource, parse_kind, validate_fields};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load the pending-edit draft for a resource or fail with 404.
async fn find_edit_draft(
    pool: &testbed_db::DbPool,
    resource_id: DbId,
) -> Result<Draft, AppError> {
    DraftRepo::find_by_resource(pool, resource_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Draft",
            id: resource_id,
        }))
}

/// Load a new-resource draft by id, scoped to the routed kind.
async fn find_new_draft(
    pool: &testbed_db::DbPool,
    kind: ResourceKind,
    draft_id: DbId,
) -> Result<Draft, AppError> {
    let draft = DraftRepo::find_by_id(pool, draft_id)
        .await?
        .filter(|d| d.kind == kind.as_str() && d.resource_id.is_none());
    draft.ok_or(AppError::Core(CoreError::NotFound {
        entity: "Draft",
        id: draft_id,
    }))
}

/// Merge an [`UpdateDraft`] patch onto a draft's current fields.
fn merge_draft_fields(draft: &Draft, input: UpdateDraft) -> CommitFields {
    CommitFields {
        name: input.name.unwrap_or_else(|| draft.name.clone()),
        description: input.description.or_else(|| draft.description.clone()),
        payload: input.payload.unwrap_or_else(|| draft.payload.clone()),
    }
}

// ---------------------------------------------------------------------------
// Pending-edit drafts
// ---------------------------------------------------------------------------

/// POST /api/v1/{resource_type}/{id}/draft
///
/// Open a draft for the resource, seeded from its current fields. If a
/// draft is already open this returns it unchanged (200 instead of 201).
pub async fn open_edit_draft(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<Response> {
    let kind = parse_kind(&resource_type)?;
    let resource = find_resource(&state.pool, kind, id).await?;

    if let Some(existing) = DraftRepo::find_by_resource(&state.pool, id).await? {
        return Ok((StatusCode::OK, Json(DataResponse { data: existing })).into_response());
    }

    let draft = DraftRepo::create_edit(&state.pool, &resource).await?;
    tracing::info!(kind = kind.as_str(), resource_id = id, "Draft opened");

    Ok((StatusCode::CREATED, Json(DataResponse { data: draft })).into_response())
}

/// GET /api/v1/{resource_type}/{id}/draft
pub async fn get_edit_draft(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    find_resource(&state.pool, kind, id).await?;
    let draft = find_edit_draft(&state.pool, id).await?;

    Ok(Json(DataResponse { data: draft }))
}

/// PUT /api/v1/{resource_type}/{id}/draft
///
/// Overwrite the draft's pending fields. No snapshot is created and the
/// committed resource is untouched.
pub async fn update_edit_draft(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
    Json(input): Json<UpdateDraft>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    find_resource(&state.pool, kind, id).await?;
    let draft = find_edit_draft(&state.pool, id).await?;

    let fields = merge_draft_fields(&draft, input);
    validate_fields(kind, &fields.name, fields.description.as_deref())?;

    let updated = DraftRepo::update_fields(&state.pool, draft.id, &fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Draft",
            id: draft.id,
        }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/{resource_type}/{id}/draft
///
/// Discard the draft without committing.
pub async fn discard_edit_draft(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    find_resource(&state.pool, kind, id).await?;
    let draft = find_edit_draft(&state.pool, id).await?;

    DraftRepo::delete(&state.pool, draft.id).await?;
    tracing::info!(kind = kind.as_str(), resource_id = id, "Draft discarded");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/{resource_type}/{id}/draft/publish
///
/// Commit the draft's fields as the resource's next snapshot and remove
/// the draft, atomically. Publishing against a concurrently deleted
/// resource is a conflict.
pub async fn publish_edit_draft(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    find_resource(&state.pool, kind, id).await?;
    let draft = find_edit_draft(&state.pool, id).await?;
    validate_fields(kind, &draft.name, draft.description.as_deref())?;

    let resource = DraftRepo::publish_edit(&state.pool, &draft, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(format!(
                "{} with id {id} was deleted; the draft can no longer be published",
                kind.entity_label()
            )))
        })?;

    state.event_bus.publish(
        ResourceEvent::new("draft.published")
            .with_resource(kind.as_str(), resource.id)
            .with_payload(json!({ "version": resource.snapshot_id })),
    );
    tracing::info!(
        kind = kind.as_str(),
        id = resource.id,
        version = resource.snapshot_id,
        "Draft published",
    );

    Ok(Json(DataResponse { data: resource }))
}

// ---------------------------------------------------------------------------
// New-resource drafts
// ---------------------------------------------------------------------------

/// POST /api/v1/{resource_type}/drafts
///
/// Open a draft for a resource that does not exist yet.
pub async fn open_new_draft(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    Json(input): Json<CreateDraft>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    validate_fields(kind, &input.name, input.description.as_deref())?;

    let draft = DraftRepo::create_new(&state.pool, kind, &input).await?;
    tracing::info!(kind = kind.as_str(), draft_id = draft.id, "New-resource draft opened");

    Ok((StatusCode::CREATED, Json(DataResponse { data: draft })))
}

/// GET /api/v1/{resource_type}/drafts
pub async fn list_new_drafts(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;

    let drafts = DraftRepo::list_new(
        &state.pool,
        kind,
        params.group,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;

    Ok(Json(DataResponse { data: drafts }))
}

/// GET /api/v1/{resource_type}/drafts/{draft_id}
pub async fn get_new_draft(
    State(state): State<AppState>,
    Path((resource_type, draft_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let draft = find_new_draft(&state.pool, kind, draft_id).await?;

    Ok(Json(DataResponse { data: draft }))
}

/// PUT /api/v1/{resource_type}/drafts/{draft_id}
pub async fn update_new_draft(
    State(state): State<AppState>,
    Path((resource_type, draft_id)): Path<(String, DbId)>,
    Json(input): Json<UpdateDraft>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let draft = find_new_draft(&state.pool, kind, draft_id).await?;

    let fields = merge_draft_fields(&draft, input);
    validate_fields(kind, &fields.name, fields.description.as_deref())?;

    let updated = DraftRepo::update_fields(&state.pool, draft.id, &fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Draft",
            id: draft_id,
        }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/{resource_type}/drafts/{draft_id}
pub async fn discard_new_draft(
    State(state): State<AppState>,
    Path((resource_type, draft_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let draft = find_new_draft(&state.pool, kind, draft_id).await?;

    DraftRepo::delete(&state.pool, draft.id).await?;
    tracing::info!(kind = kind.as_str(), draft_id, "New-resource draft discarded");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/{resource_type}/drafts/{draft_id}/publish
///
/// Create the resource (version 1) from the draft's fields and remove the
/// draft, atomically.
pub async fn publish_new_draft(
    State(state): State<AppState>,
    Path((resource_type, draft_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let kind = parse_kind(&resource_type)?;
    let draft = find_new_draft(&state.pool, kind, draft_id).await?;
    validate_fields(kind, &draft.name, draft.description.as_deref())?;

    let resource = DraftRepo::publish_new(&state.pool, &draft, kind).await?;

    state.event_bus.publish(
        ResourceEvent::new("draft.published")
            .with_resource(kind.as_str(), resource.id)
            .with_payload(json!({ "version": resource.snapshot_id })),
    );
    tracing::info!(
        kind = kind.as_str(),
        id = resource.id,
        "New-resource draft published",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}
