//! Snapshot-bound reference models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use testbed_core::types::{DbId, ResourceKind, Timestamp, Version};

/// A row from the `resource_references` table: a directed edge from a
/// dependent resource to a specific snapshot of another resource.
///
/// The edge is resolved *as of* `bound_version`, never against the
/// referenced resource's current state; only an explicit sync moves the
/// binding forward.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResourceReference {
    pub id: DbId,
    pub dependent_id: DbId,
    pub referenced_kind: String,
    pub referenced_id: DbId,
    pub bound_version: Version,
    /// Optional narrower selection inside the referenced payload
    /// (a task name within a plugin).
    pub sub_selection: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for binding a new reference. The bound version is always the
/// referenced resource's current snapshot at bind time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReference {
    pub referenced_kind: ResourceKind,
    pub referenced_id: DbId,
    pub sub_selection: Option<String>,
}
