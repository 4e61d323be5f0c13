pub mod health;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /pages                                   list, create
/// /pages/{id}                              get, delete
/// /pages/{id}/versions                     list, create (edit)
/// /pages/{id}/versions/{version}           get
/// /pages/{id}/versions/{version}/publish   publish (POST)
/// /pages/{id}/compare?v1=X&v2=Y            structural diff (GET)
/// /pages/{id}/restore/{version}            append-only restore (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/pages", pages::router())
}
