//! Handlers for page version history: list, fetch, edit, compare, restore,
//! and publish.
//!
//! Versions are immutable snapshots; edits and restores both append. The
//! compare endpoint is read-only and safe against concurrent writes because
//! snapshots never change after creation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use stanza_core::diff::compare;
use stanza_core::error::CoreError;
use stanza_core::listing::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use stanza_core::page::{validate_change_description, validate_state, validate_tags};
use stanza_core::restore::plan_restore;
use stanza_core::types::DbId;
use stanza_db::models::page_version::{
    CompareResponse, CreatePageVersion, PageVersion, RestoreRequest, RestoreResponse, VersionRef,
};
use stanza_db::repositories::PageVersionRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::pages::ensure_page;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Query param types
-------------------------------------------------------------------------- */

#[derive(Debug, serde::Deserialize)]
pub struct ListVersionsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CompareParams {
    /// The older side of the comparison.
    pub v1: i32,
    /// The newer side of the comparison.
    pub v2: i32,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// Fetch a specific version of a page or return 404.
async fn ensure_version(
    pool: &sqlx::PgPool,
    page_id: DbId,
    version: i32,
) -> AppResult<PageVersion> {
    PageVersionRepo::find_by_version(pool, page_id, version)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Page version",
                id: DbId::from(version),
            })
        })
}

/* --------------------------------------------------------------------------
Version history
-------------------------------------------------------------------------- */

/// GET /pages/{id}/versions
///
/// List all versions of a page, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ListVersionsParams>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;

    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let versions = PageVersionRepo::list_for_page(&state.pool, id, limit, offset).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /pages/{id}/versions/{version}
///
/// Fetch a specific version of a page.
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DbId, i32)>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;
    let row = ensure_version(&state.pool, id, version).await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /pages/{id}/versions
///
/// Record an edit: append a new version carrying the full page state.
pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreatePageVersion>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;

    validate_state(&input.state).map_err(AppError::Core)?;
    validate_tags(&input.tags).map_err(AppError::Core)?;
    if let Some(ref description) = input.change_description {
        validate_change_description(description).map_err(AppError::Core)?;
    }

    let state_json = serde_json::to_value(&input.state)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize page state: {e}")))?;

    let version = PageVersionRepo::create(
        &state.pool,
        id,
        &state_json,
        input.change_description.as_deref(),
        input.created_by.as_deref(),
        &input.tags,
    )
    .await?;

    tracing::info!(page_id = id, version = version.version, "Page version created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/* --------------------------------------------------------------------------
Compare
-------------------------------------------------------------------------- */

/// GET /pages/{id}/compare?v1=X&v2=Y
///
/// Compute the structural delta between two versions of a page. `v1` is
/// taken as the older side and `v2` as the newer side verbatim; swapping
/// them swaps every old/new pair in the result.
pub async fn compare_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<CompareParams>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;

    let row1 = ensure_version(&state.pool, id, params.v1).await?;
    let row2 = ensure_version(&state.pool, id, params.v2).await?;

    let older = row1.to_snapshot().map_err(AppError::Core)?;
    let newer = row2.to_snapshot().map_err(AppError::Core)?;
    let diff = compare(&older, &newer).map_err(AppError::Core)?;

    let response = CompareResponse {
        page_id: id,
        version1: VersionRef::from(&row1),
        version2: VersionRef::from(&row2),
        page_changes: diff.page_changes,
        section_changes: diff.section_changes,
    };

    Ok(Json(DataResponse { data: response }))
}

/* --------------------------------------------------------------------------
Restore
-------------------------------------------------------------------------- */

/// POST /pages/{id}/restore/{version}
///
/// Make a prior version the page's current state by appending a new version
/// cloned from it. History is never rewound: the intervening versions stay
/// retrievable unchanged. Restoring the version that is already current is
/// rejected with 409.
pub async fn restore_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DbId, i32)>,
    body: Option<Json<RestoreRequest>>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = body.unwrap_or_default();

    ensure_page(&state.pool, id).await?;
    let target = ensure_version(&state.pool, id, version).await?;
    let latest_version = PageVersionRepo::latest_version_number(&state.pool, id).await?;

    let snapshot = target.to_snapshot().map_err(AppError::Core)?;
    let plan = plan_restore(
        &snapshot,
        latest_version,
        request.change_description.as_deref(),
    )
    .map_err(AppError::Core)?;

    // Persist the target's stored state verbatim rather than re-serializing
    // the parsed form; the clone must be byte-for-byte.
    let new_version = PageVersionRepo::create(
        &state.pool,
        id,
        &target.state,
        Some(&plan.change_description),
        request.created_by.as_deref(),
        &[],
    )
    .await?;

    tracing::info!(
        page_id = id,
        restored_from = version,
        new_version = new_version.version,
        "Page restored"
    );

    let response = RestoreResponse {
        new_version_number: new_version.version,
        message: format!(
            "Restored page {id} to version {version} as new version {}",
            new_version.version
        ),
    };

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/* --------------------------------------------------------------------------
Publish
-------------------------------------------------------------------------- */

/// POST /pages/{id}/versions/{version}/publish
///
/// Mark a version as published, unpublishing any other published version of
/// the page. Snapshot state stays immutable; only the publish flags change.
pub async fn publish_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(DbId, i32)>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;

    let published = PageVersionRepo::publish(&state.pool, id, version)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Page version",
                id: DbId::from(version),
            })
        })?;

    tracing::info!(page_id = id, version = version, "Page version published");

    Ok(Json(DataResponse { data: published }))
}
