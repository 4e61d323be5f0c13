//! Structural diff engine over page snapshots.
//!
//! Compares two immutable versions of the same page and produces a complete,
//! deterministic delta: changed top-level fields plus per-section
//! added/removed/modified entries. Pure functions, no I/O.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::page::{PageState, Section};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A page's full state pinned to the version it was captured at.
///
/// Built by the caller from a stored version row; the diff engine itself
/// never touches storage.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub page_id: DbId,
    pub version: i32,
    pub state: PageState,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// An old/new value pair for a single changed field.
///
/// A field absent on one side is reported as JSON `null` on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// A single entry in the section-change list.
///
/// Added and removed entries carry the full section payload; modified
/// entries carry only the fields that differ. Fixed section attributes are
/// reported under `sectionType`, `title`, `subtitle`, `position`, and
/// `isVisible`; content fields under `content.<key>` so a content field
/// named `title` cannot collide with the section's own title.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SectionChange {
    #[serde(rename_all = "camelCase")]
    Added {
        section_key: String,
        section: Section,
    },
    #[serde(rename_all = "camelCase")]
    Removed {
        section_key: String,
        section: Section,
    },
    #[serde(rename_all = "camelCase")]
    Modified {
        section_key: String,
        changes: BTreeMap<String, FieldChange>,
    },
}

impl SectionChange {
    /// The key of the section this change refers to.
    pub fn section_key(&self) -> &str {
        match self {
            Self::Added { section_key, .. }
            | Self::Removed { section_key, .. }
            | Self::Modified { section_key, .. } => section_key,
        }
    }
}

/// The structural delta between two snapshots of the same page.
///
/// Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDiff {
    pub old_version: i32,
    pub new_version: i32,
    pub page_changes: BTreeMap<String, FieldChange>,
    pub section_changes: Vec<SectionChange>,
}

impl PageDiff {
    /// `true` if the two snapshots are structurally identical.
    pub fn is_empty(&self) -> bool {
        self.page_changes.is_empty() && self.section_changes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compute the structural delta between two snapshots of the same page.
///
/// Top-level fields (`title` plus the union of both metadata bags) are
/// compared with deep structural equality; a field present on one side only
/// diffs against JSON `null`. Sections are matched by `section_key`, never
/// by position, so reordering alone reports as a `position` change.
///
/// Ordering of `section_changes`: added and modified entries in the order
/// sections appear in `newer`, followed by removed entries in `older`'s
/// order. Field maps are sorted by key. The output is fully deterministic
/// for identical inputs.
///
/// Section keys are assumed unique within each snapshot (enforced when
/// states are written).
pub fn compare(older: &PageSnapshot, newer: &PageSnapshot) -> Result<PageDiff, CoreError> {
    if older.page_id != newer.page_id {
        return Err(CoreError::InvalidComparison(format!(
            "version {} belongs to page {} but version {} belongs to page {}",
            older.version, older.page_id, newer.version, newer.page_id
        )));
    }

    let page_changes = diff_fields(
        &top_level_fields(&older.state),
        &top_level_fields(&newer.state),
    );

    let older_by_key: BTreeMap<&str, &Section> = older
        .state
        .sections
        .iter()
        .map(|s| (s.section_key.as_str(), s))
        .collect();
    let newer_keys: BTreeSet<&str> = newer
        .state
        .sections
        .iter()
        .map(|s| s.section_key.as_str())
        .collect();

    let mut section_changes = Vec::new();

    // Added + modified, in the newer snapshot's section order.
    for section in &newer.state.sections {
        match older_by_key.get(section.section_key.as_str()) {
            None => section_changes.push(SectionChange::Added {
                section_key: section.section_key.clone(),
                section: section.clone(),
            }),
            Some(old_section) => {
                let changes =
                    diff_fields(&section_fields(old_section), &section_fields(section));
                if !changes.is_empty() {
                    section_changes.push(SectionChange::Modified {
                        section_key: section.section_key.clone(),
                        changes,
                    });
                }
            }
        }
    }

    // Removed, in the older snapshot's section order.
    for section in &older.state.sections {
        if !newer_keys.contains(section.section_key.as_str()) {
            section_changes.push(SectionChange::Removed {
                section_key: section.section_key.clone(),
                section: section.clone(),
            });
        }
    }

    Ok(PageDiff {
        old_version: older.version,
        new_version: newer.version,
        page_changes,
        section_changes,
    })
}

/// Diff two field maps with deep structural equality.
///
/// Keys absent on one side compare against `Value::Null`; keys absent from
/// both never appear. Equal values are omitted from the result.
fn diff_fields(
    old: &BTreeMap<String, Value>,
    new: &BTreeMap<String, Value>,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        let old_value = old.get(key).cloned().unwrap_or(Value::Null);
        let new_value = new.get(key).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            changes.insert(
                key.clone(),
                FieldChange {
                    old: old_value,
                    new: new_value,
                },
            );
        }
    }
    changes
}

/// Flatten the top-level document fields of a state: `title` plus the
/// metadata extension bag. Sections are diffed separately.
fn top_level_fields(state: &PageState) -> BTreeMap<String, Value> {
    let mut fields = state.meta.clone();
    fields.insert("title".to_string(), Value::String(state.title.clone()));
    fields
}

/// Flatten a section into a comparable field map.
fn section_fields(section: &Section) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "sectionType".to_string(),
        Value::String(section.section_type.clone()),
    );
    fields.insert("title".to_string(), opt_string(&section.title));
    fields.insert("subtitle".to_string(), opt_string(&section.subtitle));
    fields.insert("position".to_string(), Value::from(section.position));
    fields.insert("isVisible".to_string(), Value::Bool(section.is_visible));
    for (key, value) in &section.content {
        fields.insert(format!("content.{key}"), value.clone());
    }
    fields
}

fn opt_string(value: &Option<String>) -> Value {
    value
        .as_ref()
        .map(|s| Value::String(s.clone()))
        .unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
