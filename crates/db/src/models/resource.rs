//! Resource entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use testbed_core::types::{DbId, Timestamp, Version};

/// A row from the `resources` table, enriched with the derived `has_draft`
/// flag surfaced on listings.
///
/// `snapshot_id` is the per-resource version ordinal of the currently-active
/// snapshot; a returned snapshot is "latest" iff its version equals it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    pub kind: String,
    pub group_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub payload: serde_json::Value,
    /// Version of the currently-active snapshot.
    pub snapshot_id: Version,
    /// Whether an uncommitted draft exists for this resource.
    pub has_draft: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new resource (commits version 1).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateResource {
    pub group_id: DbId,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_payload")]
    pub payload: serde_json::Value,
}

/// DTO for committing an update. `None` fields keep their current value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub description: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Fully-resolved field values written by a commit, after merging an
/// [`UpdateResource`] onto the current state.
#[derive(Debug, Clone)]
pub struct CommitFields {
    pub name: String,
    pub description: Option<String>,
    pub payload: serde_json::Value,
}

fn default_payload() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
