//! Route definitions for the versioned-resource collections.
//!
//! Every collection (`queues`, `experiments`, `entrypoints`, `plugins`,
//! `plugin-parameter-types`, `jobs`, `models`, `artifacts`, `tags`) shares
//! one router: the `{resource_type}` segment is parsed into a
//! `ResourceKind` and unknown segments read as 404.
//!
//! Routes mounted at `/api/v1/{resource_type}`:
//!
//! ```text
//! GET    /                                -> list_resources
//! POST   /                                -> create_resource
//! GET    /drafts                          -> list_new_drafts
//! POST   /drafts                          -> open_new_draft
//! GET    /drafts/{draft_id}               -> get_new_draft
//! PUT    /drafts/{draft_id}               -> update_new_draft
//! DELETE /drafts/{draft_id}               -> discard_new_draft
//! POST   /drafts/{draft_id}/publish       -> publish_new_draft
//! GET    /{id}                            -> get_resource
//! PUT    /{id}                            -> commit_resource
//! DELETE /{id}                            -> delete_resource
//! GET    /{id}/snapshots                  -> list_snapshots
//! GET    /{id}/snapshots/{version}        -> get_snapshot
//! POST   /{id}/draft                      -> open_edit_draft
//! GET    /{id}/draft                      -> get_edit_draft
//! PUT    /{id}/draft                      -> update_edit_draft
//! DELETE /{id}/draft                      -> discard_edit_draft
//! POST   /{id}/draft/publish              -> publish_edit_draft
//! GET    /{id}/references                 -> list_references
//! POST   /{id}/references                 -> bind_reference
//! GET    /{id}/references/{ref_id}        -> resolve_reference
//! DELETE /{id}/references/{ref_id}        -> unlink_reference
//! POST   /{id}/references/{ref_id}/sync   -> sync_reference
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{drafts, references, resources, snapshots};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{resource_type}",
            get(resources::list_resources).post(resources::create_resource),
        )
        // The static `drafts` segment takes priority over `{id}`.
        .route(
            "/{resource_type}/drafts",
            get(drafts::list_new_drafts).post(drafts::open_new_draft),
        )
        .route(
            "/{resource_type}/drafts/{draft_id}",
            get(drafts::get_new_draft)
                .put(drafts::update_new_draft)
                .delete(drafts::discard_new_draft),
        )
        .route(
            "/{resource_type}/drafts/{draft_id}/publish",
            post(drafts::publish_new_draft),
        )
        .route(
            "/{resource_type}/{id}",
            get(resources::get_resource)
                .put(resources::commit_resource)
                .delete(resources::delete_resource),
        )
        .route(
            "/{resource_type}/{id}/snapshots",
            get(snapshots::list_snapshots),
        )
        .route(
            "/{resource_type}/{id}/snapshots/{version}",
            get(snapshots::get_snapshot),
        )
        .route(
            "/{resource_type}/{id}/draft",
            post(drafts::open_edit_draft)
                .get(drafts::get_edit_draft)
                .put(drafts::update_edit_draft)
                .delete(drafts::discard_edit_draft),
        )
        .route(
            "/{resource_type}/{id}/draft/publish",
            post(drafts::publish_edit_draft),
        )
        .route(
            "/{resource_type}/{id}/references",
            get(references::list_references).post(references::bind_reference),
        )
        .route(
            "/{resource_type}/{id}/references/{ref_id}",
            get(references::resolve_reference).delete(references::unlink_reference),
        )
        .route(
            "/{resource_type}/{id}/references/{ref_id}/sync",
            post(references::sync_reference),
        )
}
