//! Shared type definitions for the RYVR tree browser.
//!
//! These types are consumed by the view-model engine, the terminal front end
//! and the CLI. They carry no behavior beyond parsing, formatting and simple
//! lookups so every surface agrees on kinds, paths and limits.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod path;

pub use path::{PathParseError, PathSegment, TreePath, is_descendant_path};

/// Number of extra children revealed by a single "load more" action.
pub const LOAD_MORE_STEP: usize = 10;

/// Number of extra levels revealed by a single "load deeper" action.
pub const LOAD_DEEPER_STEP: usize = 3;

/// Classified type tag of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    /// An absent value, e.g. a record field that does not exist.
    Undefined,
    Boolean,
    Number,
    String,
    Array,
    Object,
    /// Fallback tag for values the classifier cannot place.
    Unknown,
}

impl JsonKind {
    /// Returns the lowercase label used in previews and detail panels.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Undefined => "undefined",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
            JsonKind::Unknown => "unknown",
        }
    }

    /// Only containers can be expanded; everything else is a selectable leaf.
    pub fn is_expandable(&self) -> bool {
        matches!(self, JsonKind::Array | JsonKind::Object)
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default bounds applied while rendering a tree.
///
/// Per-node limits (`max_depth`, `max_array_items`, `max_object_props`) are
/// the starting point for every node and can be relaxed on that node only.
/// Root caps cannot be relaxed in place; reopening the view is the escape
/// hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Depth at which expandable nodes stop recursing and offer "load deeper".
    pub max_depth: usize,
    /// Array children rendered before a "load more" row.
    pub max_array_items: usize,
    /// Object properties rendered before a "load more" row.
    pub max_object_props: usize,
    /// Top-level records rendered when the data is an array.
    pub root_array_entries: usize,
    /// Top-level entries rendered when the data is an object.
    pub root_object_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_array_items: 10,
            max_object_props: 15,
            root_array_entries: 8,
            root_object_entries: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_containers_expand() {
        assert!(JsonKind::Array.is_expandable());
        assert!(JsonKind::Object.is_expandable());
        for kind in [
            JsonKind::Null,
            JsonKind::Undefined,
            JsonKind::Boolean,
            JsonKind::Number,
            JsonKind::String,
            JsonKind::Unknown,
        ] {
            assert!(!kind.is_expandable(), "{kind} should not expand");
        }
    }

    #[test]
    fn limits_fill_missing_fields_with_defaults() {
        let limits: Limits = serde_json::from_str(r#"{ "max_depth": 7 }"#).expect("parse limits");
        assert_eq!(limits.max_depth, 7);
        assert_eq!(limits.root_array_entries, 8);
        assert_eq!(limits.root_object_entries, 12);
    }
}
