//! Repository for the `page_versions` table.
//!
//! Versions are immutable snapshots created on every edit and every restore.
//! Version numbers are assigned per page inside the INSERT statement; the
//! `uq_page_versions_page_version` unique index turns a concurrent
//! assignment race into a constraint violation, which is retried a bounded
//! number of times. Numbers for a page are therefore distinct and contiguous
//! even under concurrent writers.

use sqlx::{PgExecutor, PgPool};
use stanza_core::types::DbId;

use crate::models::page_version::PageVersion;

/// Column list for page_versions queries.
const COLUMNS: &str = "id, page_id, version, state, change_description, \
    created_by, created_at, is_published, published_at, tags";

/// Attempts before giving up on a contended version-number assignment.
const MAX_CREATE_ATTEMPTS: u32 = 5;

/// Provides read and create operations for page versions.
pub struct PageVersionRepo;

impl PageVersionRepo {
    /// Insert a new version snapshot, auto-assigning `MAX(version) + 1`.
    ///
    /// Safe to call concurrently for the same page: collisions on the
    /// version number retry with a freshly computed number. Each attempt is
    /// a single INSERT, so the snapshot is either fully persisted or not at
    /// all.
    pub async fn create(
        pool: &PgPool,
        page_id: DbId,
        state: &serde_json::Value,
        change_description: Option<&str>,
        created_by: Option<&str>,
        tags: &[String],
    ) -> Result<PageVersion, sqlx::Error> {
        let mut attempt = 1;
        loop {
            let result =
                try_create(pool, page_id, state, change_description, created_by, tags).await;
            match result {
                Err(ref err) if attempt < MAX_CREATE_ATTEMPTS && is_version_conflict(err) => {
                    tracing::debug!(page_id, attempt, "Version number contention, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// List versions for a page, ordered by version descending (newest first).
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_versions
             WHERE page_id = $1
             ORDER BY version DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(page_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a page version by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PageVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM page_versions WHERE id = $1");
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a specific version of a page.
    pub async fn find_by_version(
        pool: &PgPool,
        page_id: DbId,
        version: i32,
    ) -> Result<Option<PageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_versions
             WHERE page_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(page_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the latest version of a page (`None` if the page has no versions).
    pub async fn latest(pool: &PgPool, page_id: DbId) -> Result<Option<PageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_versions
             WHERE page_id = $1
             ORDER BY version DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PageVersion>(&query)
            .bind(page_id)
            .fetch_optional(pool)
            .await
    }

    /// Get the latest version number for a page (0 if none exist).
    pub async fn latest_version_number(pool: &PgPool, page_id: DbId) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) FROM page_versions WHERE page_id = $1",
        )
        .bind(page_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Count versions for a given page.
    pub async fn count_for_page(pool: &PgPool, page_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM page_versions WHERE page_id = $1")
                .bind(page_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Mark one version as published, unpublishing any other version of the
    /// same page, in a single transaction.
    ///
    /// Snapshot state stays immutable; only the publish audit flags change.
    /// Returns `None` (with no flags touched) if the version does not exist.
    pub async fn publish(
        pool: &PgPool,
        page_id: DbId,
        version: i32,
    ) -> Result<Option<PageVersion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE page_versions SET is_published = FALSE WHERE page_id = $1 AND is_published")
            .bind(page_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE page_versions
             SET is_published = TRUE, published_at = now()
             WHERE page_id = $1 AND version = $2
             RETURNING {COLUMNS}"
        );
        let published = sqlx::query_as::<_, PageVersion>(&query)
            .bind(page_id)
            .bind(version)
            .fetch_optional(&mut *tx)
            .await?;

        match published {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(row))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }
}

/// Insert a version with an explicit number on any executor.
///
/// Used inside the page-creation transaction, where version 1 cannot race
/// because the page row is not yet visible to other writers.
pub(crate) async fn insert_with_version<'e>(
    executor: impl PgExecutor<'e>,
    page_id: DbId,
    version: i32,
    state: &serde_json::Value,
    change_description: Option<&str>,
    created_by: Option<&str>,
    tags: &[String],
) -> Result<PageVersion, sqlx::Error> {
    let query = format!(
        "INSERT INTO page_versions
            (page_id, version, state, change_description, created_by, tags)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, PageVersion>(&query)
        .bind(page_id)
        .bind(version)
        .bind(state)
        .bind(change_description)
        .bind(created_by)
        .bind(tags)
        .fetch_one(executor)
        .await
}

/// One INSERT attempt with the version number computed in the statement.
async fn try_create(
    pool: &PgPool,
    page_id: DbId,
    state: &serde_json::Value,
    change_description: Option<&str>,
    created_by: Option<&str>,
    tags: &[String],
) -> Result<PageVersion, sqlx::Error> {
    let query = format!(
        "INSERT INTO page_versions
            (page_id, version, state, change_description, created_by, tags)
         VALUES (
             $1,
             COALESCE(
                 (SELECT MAX(version) FROM page_versions WHERE page_id = $1),
                 0
             ) + 1,
             $2, $3, $4, $5
         )
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, PageVersion>(&query)
        .bind(page_id)
        .bind(state)
        .bind(change_description)
        .bind(created_by)
        .bind(tags)
        .fetch_one(pool)
        .await
}

/// `true` for a unique-constraint violation on the per-page version number.
fn is_version_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_page_versions_page_version")
        }
        _ => false,
    }
}
