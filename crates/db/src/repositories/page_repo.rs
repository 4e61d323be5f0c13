//! Repository for the `pages` table.
//!
//! Pages carry identity only; every content change goes through
//! `page_versions`. Creation inserts the identity row and version 1 in a
//! single transaction so no page ever exists without a version.

use sqlx::PgPool;
use stanza_core::types::DbId;

use crate::models::page::Page;
use crate::models::page_version::PageVersion;
use crate::repositories::page_version_repo;

/// Column list for pages queries.
const COLUMNS: &str = "id, slug, created_by, created_at";

/// Provides CRUD operations for page identity rows.
pub struct PageRepo;

impl PageRepo {
    /// Create a page and its initial version atomically.
    ///
    /// Either both rows are persisted or neither is; a page with no versions
    /// cannot be observed.
    pub async fn create_with_initial_version(
        pool: &PgPool,
        slug: &str,
        created_by: Option<&str>,
        state: &serde_json::Value,
        change_description: Option<&str>,
        tags: &[String],
    ) -> Result<(Page, PageVersion), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("INSERT INTO pages (slug, created_by) VALUES ($1, $2) RETURNING {COLUMNS}");
        let page = sqlx::query_as::<_, Page>(&query)
            .bind(slug)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        // The page row is invisible until commit, so version 1 cannot race.
        let version = page_version_repo::insert_with_version(
            &mut *tx,
            page.id,
            1,
            state,
            change_description,
            created_by,
            tags,
        )
        .await?;

        tx.commit().await?;
        Ok((page, version))
    }

    /// Find a page by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a page by its slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE slug = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List pages, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Page>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pages
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Delete a page; versions cascade. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
