//! Handlers for page identity CRUD.
//!
//! Pages are identity rows; every content change flows through the version
//! endpoints. Creating a page mints version 1 in the same transaction, so a
//! page with no versions cannot be observed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use stanza_core::error::CoreError;
use stanza_core::listing::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use stanza_core::page::{generate_slug, validate_change_description, validate_slug, validate_state, validate_tags};
use stanza_core::types::DbId;
use stanza_db::models::page::{CreatePage, Page};
use stanza_db::models::page_version::PageWithState;
use stanza_db::repositories::{PageRepo, PageVersionRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Query param types
-------------------------------------------------------------------------- */

#[derive(Debug, serde::Deserialize)]
pub struct ListPagesParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

/// Fetch a page by id or return 404.
pub(crate) async fn ensure_page(pool: &sqlx::PgPool, id: DbId) -> AppResult<Page> {
    PageRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Page", id }))
}

/* --------------------------------------------------------------------------
Page CRUD
-------------------------------------------------------------------------- */

/// GET /pages
///
/// List pages, newest first.
pub async fn list_pages(
    State(state): State<AppState>,
    Query(params): Query<ListPagesParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let pages = PageRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// POST /pages
///
/// Create a page together with its initial version. Generates the slug from
/// the state's title if not provided.
pub async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<CreatePage>,
) -> AppResult<impl IntoResponse> {
    validate_state(&input.state).map_err(AppError::Core)?;
    validate_tags(&input.tags).map_err(AppError::Core)?;
    if let Some(ref description) = input.change_description {
        validate_change_description(description).map_err(AppError::Core)?;
    }

    let slug = match &input.slug {
        Some(s) => s.clone(),
        None => generate_slug(&input.state.title),
    };
    validate_slug(&slug).map_err(AppError::Core)?;

    let state_json = serde_json::to_value(&input.state)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize page state: {e}")))?;

    let (page, version) = PageRepo::create_with_initial_version(
        &state.pool,
        &slug,
        input.created_by.as_deref(),
        &state_json,
        input.change_description.as_deref(),
        &input.tags,
    )
    .await?;

    tracing::info!(page_id = page.id, slug = %page.slug, "Page created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PageWithState {
                page,
                version: version.version,
                state: version.state,
            },
        }),
    ))
}

/// GET /pages/{id}
///
/// Page identity plus its latest version's state.
pub async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let page = ensure_page(&state.pool, id).await?;
    let latest = PageVersionRepo::latest(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Page {id} has no versions")))?;

    Ok(Json(DataResponse {
        data: PageWithState {
            page,
            version: latest.version,
            state: latest.state,
        },
    }))
}

/// DELETE /pages/{id}
///
/// Delete a page and its entire version history.
pub async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_page(&state.pool, id).await?;
    PageRepo::delete(&state.pool, id).await?;

    tracing::info!(page_id = id, "Page deleted");

    Ok(StatusCode::NO_CONTENT)
}
