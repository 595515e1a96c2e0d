//! Repository for the `resource_references` table.
//!
//! A reference row never moves on its own: `rebind` (the sync operation)
//! is the only write after creation. Rows survive deletion of the
//! referenced resource so resolution can report the edge as broken.

use testbed_core::types::{DbId, ResourceKind, Version};

use crate::models::reference::ResourceReference;
use crate::DbPool;

/// Column list for resource_references queries.
const COLUMNS: &str = "id, dependent_id, referenced_kind, referenced_id, \
    bound_version, sub_selection, created_at, updated_at";

/// Provides bind, lookup, rebind, and unlink operations for
/// snapshot-bound references.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// Record a new edge bound at the referenced resource's current
    /// version.
    pub async fn create(
        pool: &DbPool,
        dependent_id: DbId,
        referenced_kind: ResourceKind,
        referenced_id: DbId,
        bound_version: Version,
        sub_selection: Option<&str>,
    ) -> Result<ResourceReference, sqlx::Error> {
        let query = format!(
            "INSERT INTO resource_references
                (dependent_id, referenced_kind, referenced_id, bound_version, sub_selection)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceReference>(&query)
            .bind(dependent_id)
            .bind(referenced_kind.as_str())
            .bind(referenced_id)
            .bind(bound_version)
            .bind(sub_selection)
            .fetch_one(pool)
            .await
    }

    /// Find a reference by id, scoped to its dependent resource.
    pub async fn find_for_dependent(
        pool: &DbPool,
        dependent_id: DbId,
        id: DbId,
    ) -> Result<Option<ResourceReference>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resource_references
             WHERE id = ? AND dependent_id = ?"
        );
        sqlx::query_as::<_, ResourceReference>(&query)
            .bind(id)
            .bind(dependent_id)
            .fetch_optional(pool)
            .await
    }

    /// List all references held by a dependent resource, oldest-first
    /// (creation order matches the dependent's field order).
    pub async fn list_by_dependent(
        pool: &DbPool,
        dependent_id: DbId,
    ) -> Result<Vec<ResourceReference>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resource_references
             WHERE dependent_id = ?
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ResourceReference>(&query)
            .bind(dependent_id)
            .fetch_all(pool)
            .await
    }

    /// Re-bind a reference to a new version, replacing the sub-selection
    /// (possibly clearing it). This is the sync write.
    pub async fn rebind(
        pool: &DbPool,
        id: DbId,
        bound_version: Version,
        sub_selection: Option<&str>,
    ) -> Result<Option<ResourceReference>, sqlx::Error> {
        let query = format!(
            "UPDATE resource_references
             SET bound_version = ?, sub_selection = ?,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResourceReference>(&query)
            .bind(bound_version)
            .bind(sub_selection)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Remove a reference edge.
    pub async fn delete(
        pool: &DbPool,
        dependent_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM resource_references WHERE id = ? AND dependent_id = ?")
                .bind(id)
                .bind(dependent_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
