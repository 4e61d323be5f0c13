//! Append-only restore planning.
//!
//! Restoring never rewinds history: it clones a target version's state into
//! a brand-new version on top of the existing sequence. This module decides
//! whether a restore is allowed and what the new version should contain; the
//! repository layer persists the plan atomically.

use crate::diff::PageSnapshot;
use crate::error::CoreError;
use crate::page::{validate_change_description, PageState};

/// The new version a restore will append.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    /// State cloned verbatim from the target version.
    pub state: PageState,
    /// Change description attributed to the restore.
    pub change_description: String,
}

/// Plan a restore of `target` given the page's current latest version number.
///
/// Restoring the version that is already current is rejected with
/// [`CoreError::AlreadyCurrent`]: the editing surface never offers it, so a
/// request for it indicates a stale caller, and silently minting a duplicate
/// version would pollute the history.
///
/// When `description` is `None` a system-attributed description naming the
/// restore source is used.
pub fn plan_restore(
    target: &PageSnapshot,
    latest_version: i32,
    description: Option<&str>,
) -> Result<RestorePlan, CoreError> {
    if target.version == latest_version {
        return Err(CoreError::AlreadyCurrent(format!(
            "version {} is already the current version of page {}",
            target.version, target.page_id
        )));
    }
    if target.version > latest_version {
        // A stored version newer than the latest means the caller passed an
        // inconsistent pair; surface it rather than guessing.
        return Err(CoreError::Internal(format!(
            "target version {} is ahead of latest version {} for page {}",
            target.version, latest_version, target.page_id
        )));
    }

    let change_description = match description {
        Some(text) => {
            validate_change_description(text)?;
            text.to_string()
        }
        None => format!("Restored from version {}", target.version),
    };

    Ok(RestorePlan {
        state: target.state.clone(),
        change_description,
    })
}
