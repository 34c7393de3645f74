//! Loading workflow output documents for the browser.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::path_processing::{expand_tilde, is_yaml_path};

/// Reads a JSON or YAML document from a file, or from stdin when `source` is `-`.
///
/// YAML is chosen by file extension; stdin and every other extension are
/// parsed as JSON.
pub fn load_document(source: &str) -> Result<Value> {
    if source.trim() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read document from stdin")?;
        return parse_document(&content, false);
    }

    let path = expand_tilde(source);
    let content = fs::read(&path).with_context(|| format!("Failed to read document: {}", path.display()))?;
    let content = String::from_utf8_lossy(&content);
    parse_document(&content, is_yaml_path(Path::new(&path)))
        .with_context(|| format!("Failed to parse document: {}", path.display()))
}

/// Parses document text as YAML or JSON.
pub fn parse_document(content: &str, yaml: bool) -> Result<Value> {
    if yaml {
        serde_yaml::from_str::<Value>(content).context("Invalid YAML document")
    } else {
        serde_json::from_str::<Value>(content).context("Invalid JSON document")
    }
}
