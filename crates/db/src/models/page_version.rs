//! Page version model and DTOs.
//!
//! Versions are immutable full-state snapshots, created on every edit and on
//! every restore. Only the publish flags change after insert.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stanza_core::diff::{FieldChange, PageSnapshot, SectionChange};
use stanza_core::error::CoreError;
use stanza_core::page::PageState;
use stanza_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `page_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageVersion {
    pub id: DbId,
    pub page_id: DbId,
    pub version: i32,
    pub state: serde_json::Value,
    pub change_description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Timestamp,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub tags: Vec<String>,
}

impl PageVersion {
    /// Deserialize the stored state into its typed representation.
    pub fn parse_state(&self) -> Result<PageState, CoreError> {
        serde_json::from_value(self.state.clone()).map_err(|e| {
            CoreError::Internal(format!(
                "stored state of version {} for page {} is not a valid page state: {e}",
                self.version, self.page_id
            ))
        })
    }

    /// View this row as a diff-engine snapshot.
    pub fn to_snapshot(&self) -> Result<PageSnapshot, CoreError> {
        Ok(PageSnapshot {
            page_id: self.page_id,
            version: self.version,
            state: self.parse_state()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Write DTOs
// ---------------------------------------------------------------------------

/// Input for creating a new version record (an edit of the page).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageVersion {
    pub state: PageState,
    pub change_description: Option<String>,
    pub created_by: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Optional request body for the restore endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    /// Overrides the system-attributed "Restored from version N" description.
    pub change_description: Option<String>,
    pub created_by: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Identifying metadata for one side of a comparison.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRef {
    pub version_number: i32,
    pub created_at: Timestamp,
    pub created_by: Option<String>,
}

impl From<&PageVersion> for VersionRef {
    fn from(row: &PageVersion) -> Self {
        Self {
            version_number: row.version,
            created_at: row.created_at,
            created_by: row.created_by.clone(),
        }
    }
}

/// Response for the version compare endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub page_id: DbId,
    pub version1: VersionRef,
    pub version2: VersionRef,
    pub page_changes: BTreeMap<String, FieldChange>,
    pub section_changes: Vec<SectionChange>,
}

/// Response for the restore endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub new_version_number: i32,
    pub message: String,
}

/// A page's identity joined with its latest version's state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWithState {
    #[serde(flatten)]
    pub page: super::page::Page,
    pub version: i32,
    pub state: serde_json::Value,
}
