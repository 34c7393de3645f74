//! Caller-owned set of selected leaf paths.
//!
//! The browser only ever reads a `SelectionSet`; toggles are reported back as
//! intents and the owner applies them before the next render.

use indexmap::IndexSet;
use ryvr_types::is_descendant_path;

/// Insertion-ordered set of path strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: IndexSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds the path when absent, removes it otherwise.
    ///
    /// Returns `true` when the path is selected after the call.
    pub fn toggle(&mut self, path: &str) -> bool {
        if self.paths.shift_remove(path) {
            false
        } else {
            self.paths.insert(path.to_string());
            true
        }
    }

    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.shift_remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// True when some selected path lies strictly below `path`.
    pub fn has_selected_descendant(&self, path: &str) -> bool {
        self.paths.iter().any(|candidate| is_descendant_path(candidate, path))
    }

    /// True when `path` itself or any descendant is selected.
    pub fn contains_within(&self, path: &str) -> bool {
        self.contains(path) || self.has_selected_descendant(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_paths(iter)
    }
}
