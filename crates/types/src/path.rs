//! Paths that locate a value inside a JSON tree.
//!
//! The string form joins object keys with `.` and writes array indices as
//! `[i]`, for example `fetch.output.items[0].id`. Two paths are equal when
//! their string forms are equal.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// One step of a [`TreePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Ordered sequence of segments identifying a location in a JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    segments: Vec<PathSegment>,
}

/// Failure to parse the string form of a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("path is empty")]
    Empty,
    #[error("empty key segment at byte {0}")]
    EmptySegment(usize),
    #[error("unterminated index bracket at byte {0}")]
    UnterminatedIndex(usize),
    #[error("invalid array index '{0}'")]
    InvalidIndex(String),
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path extended with an object key.
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Returns a new path extended with an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Human label of the final segment (`key` or `[i]`).
    pub fn label(&self) -> String {
        match self.segments.last() {
            Some(PathSegment::Key(key)) => key.clone(),
            Some(PathSegment::Index(index)) => format!("[{index}]"),
            None => String::new(),
        }
    }

    /// True when `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// Walks `value` along this path.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PathParseError::Empty);
        }

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut key_start = 0usize;
        let mut chars = input.char_indices().peekable();
        // Set after `]` so that `a[0].b` and `a[0][1]` do not demand a key.
        let mut after_index = false;

        while let Some((offset, character)) = chars.next() {
            match character {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(PathParseError::EmptySegment(key_start));
                    }
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    after_index = false;
                    key_start = offset + 1;
                    if chars.peek().is_none() {
                        return Err(PathParseError::EmptySegment(key_start));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(inner);
                    }
                    if !closed {
                        return Err(PathParseError::UnterminatedIndex(offset));
                    }
                    let index = digits
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| PathParseError::InvalidIndex(digits.clone()))?;
                    segments.push(PathSegment::Index(index));
                    after_index = true;
                }
                other => {
                    if after_index {
                        return Err(PathParseError::EmptySegment(offset));
                    }
                    key.push(other);
                }
            }
        }

        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
        Ok(Self { segments })
    }
}

/// String-form descendant test used by selection lookups.
///
/// `candidate` is a descendant of `ancestor` when it extends it with a `.`
/// key or a `[` index. An empty ancestor (the root) contains every path.
pub fn is_descendant_path(candidate: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !candidate.is_empty();
    }
    candidate
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn displays_keys_and_indices() {
        let path = TreePath::root().child_key("fetch").child_key("items").child_index(2).child_key("id");
        assert_eq!(path.to_string(), "fetch.items[2].id");
        assert_eq!(path.label(), "id");
        assert_eq!(TreePath::root().child_index(0).to_string(), "[0]");
    }

    #[test]
    fn parses_back_to_the_same_segments() {
        let parsed: TreePath = "fetch.items[2].id".parse().expect("valid path");
        let expected = TreePath::root().child_key("fetch").child_key("items").child_index(2).child_key("id");
        assert_eq!(parsed, expected);

        let nested: TreePath = "matrix[0][1]".parse().expect("valid path");
        assert_eq!(nested.segments().len(), 3);
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!("".parse::<TreePath>(), Err(PathParseError::Empty));
        assert!(matches!("a..b".parse::<TreePath>(), Err(PathParseError::EmptySegment(_))));
        assert!(matches!("a.".parse::<TreePath>(), Err(PathParseError::EmptySegment(_))));
        assert!(matches!("a[1".parse::<TreePath>(), Err(PathParseError::UnterminatedIndex(1))));
        assert!(matches!("a[x]".parse::<TreePath>(), Err(PathParseError::InvalidIndex(_))));
        assert!(matches!("a[0]b".parse::<TreePath>(), Err(PathParseError::EmptySegment(_))));
    }

    #[test]
    fn resolves_against_values() {
        let value = json!({ "a": { "list": [10, { "b": true }] } });
        let path: TreePath = "a.list[1].b".parse().expect("valid path");
        assert_eq!(path.resolve(&value), Some(&json!(true)));
        let missing: TreePath = "a.list[5]".parse().expect("valid path");
        assert_eq!(missing.resolve(&value), None);
    }

    #[test]
    fn descendant_checks_respect_segment_boundaries() {
        assert!(is_descendant_path("a.b", "a"));
        assert!(is_descendant_path("a[0]", "a"));
        assert!(!is_descendant_path("ab", "a"));
        assert!(!is_descendant_path("a", "a"));

        let ancestor: TreePath = "a".parse().expect("valid path");
        let child: TreePath = "a[3].x".parse().expect("valid path");
        assert!(ancestor.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&ancestor));
    }
}
