//! Draft entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use testbed_core::types::{DbId, Timestamp};

/// A row from the `drafts` table: an uncommitted edit.
///
/// `resource_id` is `Some` for a pending edit to an existing resource
/// (unique per resource) and `None` for a new-resource draft.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Draft {
    pub id: DbId,
    pub kind: String,
    pub group_id: DbId,
    pub resource_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening a new-resource draft.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraft {
    pub group_id: DbId,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_payload")]
    pub payload: serde_json::Value,
}

/// DTO for updating a draft in place. `None` fields keep their value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub payload: Option<serde_json::Value>,
}

fn default_payload() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
