//! Route definitions for pages and their version history.
//!
//! Registered under `/pages`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{pages, versions};
use crate::state::AppState;

/// Page routes, registered as `/pages`.
///
/// ```text
/// GET    /                                  list_pages
/// POST   /                                  create_page
/// GET    /{id}                              get_page
/// DELETE /{id}                              delete_page
/// GET    /{id}/versions                     list_versions
/// POST   /{id}/versions                     create_version
/// GET    /{id}/versions/{version}           get_version
/// POST   /{id}/versions/{version}/publish   publish_version
/// GET    /{id}/compare                      compare_versions
/// POST   /{id}/restore/{version}            restore_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::list_pages).post(pages::create_page))
        .route("/{id}", get(pages::get_page).delete(pages::delete_page))
        .route(
            "/{id}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route("/{id}/versions/{version}", get(versions::get_version))
        .route(
            "/{id}/versions/{version}/publish",
            post(versions::publish_version),
        )
        .route("/{id}/compare", get(versions::compare_versions))
        .route("/{id}/restore/{version}", post(versions::restore_version))
}
