//! Repository for the `resources` table and its snapshot history.
//!
//! Every committed mutation appends a row to `snapshots` and moves the
//! resource's `snapshot_id` pointer, inside one transaction. Versions are
//! allocated with `COALESCE(MAX(version), 0) + 1` so concurrent commits
//! against the same resource cannot mint duplicate or out-of-order values.

use sqlx::{Sqlite, Transaction};
use testbed_core::types::{DbId, ResourceKind, Version};

use crate::models::resource::{CommitFields, CreateResource, Resource};
use crate::DbPool;

/// Column list for resources queries. `has_draft` is derived, so selects go
/// through the `resources r` alias rather than `RETURNING`.
const COLUMNS: &str = "r.id, r.kind, r.group_id, r.name, r.description, r.payload, \
    r.snapshot_id, \
    EXISTS(SELECT 1 FROM drafts d WHERE d.resource_id = r.id) AS has_draft, \
    r.created_at, r.updated_at";

/// Provides CRUD and commit operations for versioned resources.
pub struct ResourceRepo;

impl ResourceRepo {
    /// Insert a new resource and its version-1 snapshot in one transaction.
    ///
    /// A name collision within `(kind, group_id)` surfaces as a unique
    /// constraint violation on `uq_resources_kind_group_name`.
    pub async fn create(
        pool: &DbPool,
        kind: ResourceKind,
        input: &CreateResource,
    ) -> Result<Resource, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let fields = CommitFields {
            name: input.name.clone(),
            description: input.description.clone(),
            payload: input.payload.clone(),
        };
        let id = Self::create_in_tx(&mut tx, kind, input.group_id, &fields).await?;
        let resource = Self::fetch_in_tx(&mut tx, id).await?;

        tx.commit().await?;
        Ok(resource)
    }

    /// Find a resource by id, scoped to a kind so route mismatches read as
    /// not-found.
    pub async fn find_by_id(
        pool: &DbPool,
        kind: ResourceKind,
        id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources r WHERE r.id = ? AND r.kind = ?");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Find a resource by id alone (any kind). Used when resolving
    /// references, which carry their own kind token.
    pub async fn find_any_kind(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources r WHERE r.id = ?");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List resources of a kind, newest-first, optionally filtered by group.
    pub async fn list(
        pool: &DbPool,
        kind: ResourceKind,
        group_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        match group_id {
            Some(group) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM resources r
                     WHERE r.kind = ? AND r.group_id = ?
                     ORDER BY r.created_at DESC, r.id DESC
                     LIMIT ? OFFSET ?"
                );
                sqlx::query_as::<_, Resource>(&query)
                    .bind(kind.as_str())
                    .bind(group)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM resources r
                     WHERE r.kind = ?
                     ORDER BY r.created_at DESC, r.id DESC
                     LIMIT ? OFFSET ?"
                );
                sqlx::query_as::<_, Resource>(&query)
                    .bind(kind.as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Commit an update: append the next snapshot and move the resource's
    /// current fields and `snapshot_id` pointer, in one transaction.
    ///
    /// Returns `None` if the resource does not exist (or is a different
    /// kind); nothing is written in that case.
    pub async fn commit_update(
        pool: &DbPool,
        kind: ResourceKind,
        id: DbId,
        fields: &CommitFields,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM resources WHERE id = ? AND kind = ?")
                .bind(id)
                .bind(kind.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        Self::commit_in_tx(&mut tx, id, fields).await?;
        let resource = Self::fetch_in_tx(&mut tx, id).await?;

        tx.commit().await?;
        Ok(Some(resource))
    }

    /// Delete a resource identity.
    ///
    /// Foreign keys cascade the snapshot history, any draft, and the
    /// dependent's own outbound references. Inbound references from other
    /// dependents are left in place and become dangling.
    pub async fn delete(
        pool: &DbPool,
        kind: ResourceKind,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ? AND kind = ?")
            .bind(id)
            .bind(kind.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- transaction-scoped steps (shared with draft publishing) -----------

    /// Insert a resource row and its version-1 snapshot. Returns the new id.
    pub(crate) async fn create_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        kind: ResourceKind,
        group_id: DbId,
        fields: &CommitFields,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO resources (kind, group_id, name, description, payload, snapshot_id)
             VALUES (?, ?, ?, ?, ?, 1)
             RETURNING id",
        )
        .bind(kind.as_str())
        .bind(group_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.payload)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO snapshots (resource_id, version, name, description, payload)
             VALUES (?, 1, ?, ?, ?)",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.payload)
        .execute(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Append the next snapshot for an existing resource and update its
    /// current fields. Returns the allocated version.
    pub(crate) async fn commit_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
        fields: &CommitFields,
    ) -> Result<Version, sqlx::Error> {
        let (version,): (Version,) = sqlx::query_as(
            "INSERT INTO snapshots (resource_id, version, name, description, payload)
             VALUES (
                 ?,
                 (SELECT COALESCE(MAX(version), 0) + 1 FROM snapshots WHERE resource_id = ?),
                 ?, ?, ?
             )
             RETURNING version",
        )
        .bind(id)
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.payload)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE resources
             SET name = ?, description = ?, payload = ?, snapshot_id = ?,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.payload)
        .bind(version)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(version)
    }

    /// Load a resource row (with derived `has_draft`) inside a transaction.
    pub(crate) async fn fetch_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: DbId,
    ) -> Result<Resource, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources r WHERE r.id = ?");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }
}
