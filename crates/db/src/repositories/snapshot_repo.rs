//! Repository for the `snapshots` table.
//!
//! Read-only: snapshot rows are written by [`ResourceRepo`] commits and
//! removed only when the parent resource is deleted.
//!
//! [`ResourceRepo`]: crate::repositories::ResourceRepo

use testbed_core::types::{DbId, Version};

use crate::models::snapshot::Snapshot;
use crate::DbPool;

/// Column list for snapshots queries.
const COLUMNS: &str = "id, resource_id, version, name, description, payload, created_at";

/// Provides read access to a resource's immutable version history.
pub struct SnapshotRepo;

impl SnapshotRepo {
    /// Find a specific snapshot by resource id and version number.
    pub async fn find_by_version(
        pool: &DbPool,
        resource_id: DbId,
        version: Version,
    ) -> Result<Option<Snapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM snapshots
             WHERE resource_id = ? AND version = ?"
        );
        sqlx::query_as::<_, Snapshot>(&query)
            .bind(resource_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// List snapshots for a resource, ordered by version descending
    /// (newest first).
    pub async fn list_history(
        pool: &DbPool,
        resource_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Snapshot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM snapshots
             WHERE resource_id = ?
             ORDER BY version DESC
             LIMIT ? OFFSET ?"
        );
        sqlx::query_as::<_, Snapshot>(&query)
            .bind(resource_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count snapshots for a given resource.
    pub async fn count_for_resource(
        pool: &DbPool,
        resource_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM snapshots WHERE resource_id = ?")
                .bind(resource_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
