//! Page identity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stanza_core::page::PageState;
use stanza_core::types::{DbId, Timestamp};

/// A row from the `pages` table.
///
/// Pages are identity-only: their content lives on `page_versions`, and the
/// current state is always the latest version's state. Edits never mutate
/// this row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub slug: String,
    pub created_by: Option<String>,
    pub created_at: Timestamp,
}

/// Input for creating a page together with its initial version.
///
/// When `slug` is omitted it is generated from the state's title.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePage {
    pub slug: Option<String>,
    pub state: PageState,
    pub change_description: Option<String>,
    pub created_by: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
