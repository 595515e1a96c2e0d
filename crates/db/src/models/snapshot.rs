//! Snapshot entity model.

use serde::Serialize;
use sqlx::FromRow;
use testbed_core::types::{DbId, Timestamp, Version};

/// A row from the `snapshots` table: one immutable historical version of a
/// resource's fields. Created only by commits, removed only with the parent
/// resource identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Snapshot {
    pub id: DbId,
    pub resource_id: DbId,
    pub version: Version,
    pub name: String,
    pub description: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
