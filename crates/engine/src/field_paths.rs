//! Shared helpers for top-level entries, leaf paths and path resolution.
//!
//! The renderer, the selection validator and the CLI path listing all go
//! through [`top_level_entries`] so a record's label means the same thing on
//! every surface.

use std::collections::HashSet;

use ryvr_types::{JsonKind, PathSegment, TreePath};
use serde_json::Value;
use thiserror::Error;

use crate::classify::classify;

/// Why a path cannot be selected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionPathError {
    #[error("path '{0}' does not exist in the data")]
    Missing(String),
    #[error("path '{path}' points at {kind} value; only scalar leaves can be selected")]
    NotLeaf { path: String, kind: JsonKind },
}

/// Returns the labelled top-level entries of `data`.
///
/// Arrays are treated as lists of records labelled by `id_field` (string or
/// number), falling back to `item_{index}` when the field is missing or the
/// label was already taken. A placeholder that is itself taken gets a `_2`,
/// `_3`, ... suffix, so labels are always unique. Objects yield their own
/// entries in order.
/// Scalars have no entries and return `None`.
pub fn top_level_entries<'a>(data: &'a Value, id_field: &str) -> Option<Vec<(String, &'a Value)>> {
    match data {
        Value::Array(records) => {
            let mut seen = HashSet::new();
            let entries = records
                .iter()
                .enumerate()
                .map(|(index, record)| {
                    let label = record_label(record, id_field)
                        .filter(|label| !seen.contains(label))
                        .unwrap_or_else(|| placeholder_label(index, &seen));
                    seen.insert(label.clone());
                    (label, record)
                })
                .collect();
            Some(entries)
        }
        Value::Object(map) => Some(map.iter().map(|(key, value)| (key.clone(), value)).collect()),
        _ => None,
    }
}

fn record_label(record: &Value, id_field: &str) -> Option<String> {
    match record.get(id_field)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// `item_{index}`, or `item_{index}_{n}` for the first `n >= 2` not yet taken.
fn placeholder_label(index: usize, seen: &HashSet<String>) -> String {
    let base = format!("item_{index}");
    if !seen.contains(&base) {
        return base;
    }
    (2..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(base)
}

/// Resolves a browser path against `data`, honoring record labels.
pub fn resolve_entry<'a>(data: &'a Value, path: &TreePath, id_field: &str) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let PathSegment::Key(label) = first else {
        return None;
    };
    let entries = top_level_entries(data, id_field)?;
    let (_, root_value) = entries.into_iter().find(|(candidate, _)| candidate == label)?;
    TreePath::from_segments(rest.to_vec()).resolve(root_value)
}

/// Checks that `path` exists and names a selectable leaf.
pub fn validate_selection(data: &Value, path: &TreePath, id_field: &str) -> Result<(), SelectionPathError> {
    let resolved = resolve_entry(data, path, id_field).ok_or_else(|| SelectionPathError::Missing(path.to_string()))?;
    let kind = classify(Some(resolved));
    if kind.is_expandable() {
        return Err(SelectionPathError::NotLeaf {
            path: path.to_string(),
            kind,
        });
    }
    Ok(())
}

/// Every selectable leaf path in document order.
pub fn leaf_paths(data: &Value, id_field: &str) -> Vec<TreePath> {
    let mut paths = Vec::new();
    let Some(entries) = top_level_entries(data, id_field) else {
        return paths;
    };
    for (label, value) in entries {
        collect_leaf_paths(value, TreePath::root().child_key(label), &mut paths);
    }
    paths
}

fn collect_leaf_paths(value: &Value, current: TreePath, out: &mut Vec<TreePath>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                collect_leaf_paths(nested, current.child_key(key.as_str()), out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                collect_leaf_paths(nested, current.child_index(index), out);
            }
        }
        _ => out.push(current),
    }
}
