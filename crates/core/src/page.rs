//! Page state types, validation, and slug generation.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API/repository layer and any future CLI or worker tooling.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length of a page title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a section key.
pub const MAX_SECTION_KEY_LEN: usize = 100;

/// Maximum number of tags on a single version.
pub const MAX_TAGS: usize = 20;

/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 50;

/// Maximum length of a version change description.
pub const MAX_CHANGE_DESCRIPTION_LEN: usize = 1000;

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// Full state of a page at a point in time.
///
/// Stored verbatim as JSONB on every version row. Top-level fields the
/// service does not model explicitly (SEO metadata, layout hints, ...) are
/// preserved in `meta` via `#[serde(flatten)]` so the diff engine can compare
/// them without assuming specific keys exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Free-form metadata fields not modeled explicitly.
    #[serde(flatten)]
    pub meta: BTreeMap<String, Value>,
}

/// A named content block inside a page.
///
/// Sections are identified across versions by `section_key`, never by
/// position: reordering alone shows up as a `position` field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_key: String,
    pub section_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Free-form content payload (field name -> value).
    #[serde(default)]
    pub content: BTreeMap<String, Value>,
    pub position: i32,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a page title.
///
/// Converts to lowercase, replaces special characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn generate_slug(title: &str) -> String {
    let raw: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    // Collapse consecutive hyphens.
    let mut result = String::with_capacity(raw.len());
    let mut prev_hyphen = false;
    for c in raw.chars() {
        if c == '-' {
            if !prev_hyphen {
                result.push('-');
            }
            prev_hyphen = true;
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a page title (non-empty, <= 200 chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a page slug (non-empty, only lowercase alphanumeric + hyphens).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

/// Validate a section key (same shape as a slug, <= 100 chars).
pub fn validate_section_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() {
        return Err(CoreError::Validation("Section key must not be empty".into()));
    }
    if key.len() > MAX_SECTION_KEY_LEN {
        return Err(CoreError::Validation(format!(
            "Section key must be at most {MAX_SECTION_KEY_LEN} characters"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(format!(
            "Section key '{key}' must contain only lowercase alphanumeric characters and hyphens"
        )));
    }
    Ok(())
}

/// Validate version tags (each non-empty, <= 50 chars, max 20 tags).
pub fn validate_tags(tags: &[String]) -> Result<(), CoreError> {
    if tags.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "A maximum of {MAX_TAGS} tags is allowed"
        )));
    }
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(CoreError::Validation("Tags must not be empty".into()));
        }
        if tag.len() > MAX_TAG_LEN {
            return Err(CoreError::Validation(format!(
                "Each tag must be at most {MAX_TAG_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Validate a version change description (<= 1000 chars).
pub fn validate_change_description(description: &str) -> Result<(), CoreError> {
    if description.len() > MAX_CHANGE_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Change description must be at most {MAX_CHANGE_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a full page state: title, every section key, and key uniqueness.
///
/// Section keys must be unique within one state; the diff engine matches
/// sections across versions by key and relies on this.
pub fn validate_state(state: &PageState) -> Result<(), CoreError> {
    validate_title(&state.title)?;

    let mut seen = BTreeSet::new();
    for section in &state.sections {
        validate_section_key(&section.section_key)?;
        if section.section_type.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Section '{}' has an empty section type",
                section.section_key
            )));
        }
        if !seen.insert(section.section_key.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate section key '{}'",
                section.section_key
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
