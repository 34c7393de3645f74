//! Shallow search filter.
//!
//! A node matches when the term occurs in its key or, for string values, in
//! the value itself. Containers are never pruned by the renderer because a
//! match further down cannot be known without descending.

use serde_json::Value;

/// Case-insensitive substring match of `term` against a node.
///
/// The term is used as typed; only an empty term matches everything.
pub fn matches(key: &str, value: Option<&Value>, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    if key.to_lowercase().contains(&needle) {
        return true;
    }
    matches!(value, Some(Value::String(text)) if text.to_lowercase().contains(&needle))
}
