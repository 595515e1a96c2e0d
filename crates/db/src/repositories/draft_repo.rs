//! Repository for the `drafts` table and draft publishing.
//!
//! At most one draft exists per resource (unique index); new-resource
//! drafts carry a NULL `resource_id`. Publishing reuses the transactional
//! commit steps from [`ResourceRepo`] so a publish either fully lands
//! (snapshot + current state + draft removal) or changes nothing.
//!
//! [`ResourceRepo`]: crate::repositories::ResourceRepo

use testbed_core::types::{DbId, ResourceKind};

use crate::models::draft::{CreateDraft, Draft};
use crate::models::resource::{CommitFields, Resource};
use crate::repositories::ResourceRepo;
use crate::DbPool;

/// Column list for drafts queries.
const COLUMNS: &str =
    "id, kind, group_id, resource_id, name, description, payload, created_at, updated_at";

/// Provides the draft lifecycle: open, update, publish, discard.
pub struct DraftRepo;

impl DraftRepo {
    /// Open a pending-edit draft for an existing resource, seeded from its
    /// current fields.
    ///
    /// A second open for the same resource violates `uq_drafts_resource`.
    pub async fn create_edit(
        pool: &DbPool,
        resource: &Resource,
    ) -> Result<Draft, sqlx::Error> {
        let query = format!(
            "INSERT INTO drafts (kind, group_id, resource_id, name, description, payload)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(&resource.kind)
            .bind(resource.group_id)
            .bind(resource.id)
            .bind(&resource.name)
            .bind(&resource.description)
            .bind(&resource.payload)
            .fetch_one(pool)
            .await
    }

    /// Open a new-resource draft (no resource identity yet).
    pub async fn create_new(
        pool: &DbPool,
        kind: ResourceKind,
        input: &CreateDraft,
    ) -> Result<Draft, sqlx::Error> {
        let query = format!(
            "INSERT INTO drafts (kind, group_id, resource_id, name, description, payload)
             VALUES (?, ?, NULL, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(kind.as_str())
            .bind(input.group_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.payload)
            .fetch_one(pool)
            .await
    }

    /// Find a draft by its primary key.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drafts WHERE id = ?");
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the pending-edit draft for a resource, if any.
    pub async fn find_by_resource(
        pool: &DbPool,
        resource_id: DbId,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drafts WHERE resource_id = ?");
        sqlx::query_as::<_, Draft>(&query)
            .bind(resource_id)
            .fetch_optional(pool)
            .await
    }

    /// List new-resource drafts of a kind, newest-first, optionally
    /// filtered by group.
    pub async fn list_new(
        pool: &DbPool,
        kind: ResourceKind,
        group_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Draft>, sqlx::Error> {
        match group_id {
            Some(group) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM drafts
                     WHERE kind = ? AND group_id = ? AND resource_id IS NULL
                     ORDER BY created_at DESC, id DESC
                     LIMIT ? OFFSET ?"
                );
                sqlx::query_as::<_, Draft>(&query)
                    .bind(kind.as_str())
                    .bind(group)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM drafts
                     WHERE kind = ? AND resource_id IS NULL
                     ORDER BY created_at DESC, id DESC
                     LIMIT ? OFFSET ?"
                );
                sqlx::query_as::<_, Draft>(&query)
                    .bind(kind.as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Overwrite a draft's pending fields in place. No snapshot is created
    /// and the committed resource is untouched.
    pub async fn update_fields(
        pool: &DbPool,
        id: DbId,
        fields: &CommitFields,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!(
            "UPDATE drafts
             SET name = ?, description = ?, payload = ?,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(&fields.name)
            .bind(&fields.description)
            .bind(&fields.payload)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Discard a draft without committing.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Publish a pending-edit draft: commit its fields as the resource's
    /// next snapshot and remove the draft, in one transaction.
    ///
    /// Returns `None` if the underlying resource was deleted since the
    /// draft was opened (the caller reports a conflict); nothing is written
    /// in that case.
    pub async fn publish_edit(
        pool: &DbPool,
        draft: &Draft,
        resource_id: DbId,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> = sqlx::query_as("SELECT id FROM resources WHERE id = ?")
            .bind(resource_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let fields = CommitFields {
            name: draft.name.clone(),
            description: draft.description.clone(),
            payload: draft.payload.clone(),
        };
        ResourceRepo::commit_in_tx(&mut tx, resource_id, &fields).await?;

        sqlx::query("DELETE FROM drafts WHERE id = ?")
            .bind(draft.id)
            .execute(&mut *tx)
            .await?;

        let resource = ResourceRepo::fetch_in_tx(&mut tx, resource_id).await?;
        tx.commit().await?;
        Ok(Some(resource))
    }

    /// Publish a new-resource draft: create the resource (version 1) from
    /// the draft's fields and remove the draft, in one transaction.
    ///
    /// `kind` is the parsed kind of the route the draft lives under; it
    /// matches the draft's stored kind token.
    pub async fn publish_new(
        pool: &DbPool,
        draft: &Draft,
        kind: ResourceKind,
    ) -> Result<Resource, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let fields = CommitFields {
            name: draft.name.clone(),
            description: draft.description.clone(),
            payload: draft.payload.clone(),
        };
        let id = ResourceRepo::create_in_tx(&mut tx, kind, draft.group_id, &fields).await?;

        sqlx::query("DELETE FROM drafts WHERE id = ?")
            .bind(draft.id)
            .execute(&mut *tx)
            .await?;

        let resource = ResourceRepo::fetch_in_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(resource)
    }
}
