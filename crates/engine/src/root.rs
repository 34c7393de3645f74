//! Top-level dispatch.
//!
//! Decides whether the data is a list of records or a plain object, renders
//! a capped number of top-level entries, and reports the rest through a
//! [`RootNotice`]. The root cap is never relaxed in place.

use indexmap::IndexMap;
use ryvr_types::{Limits, TreePath};
use serde_json::Value;
use tracing::debug;

use crate::field_paths::top_level_entries;
use crate::render::{RenderNode, Renderer};

/// Message shown when the data has nothing to browse.
pub const NO_DATA_MESSAGE: &str = "No data available.";

/// Top-level entries that were not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootNotice {
    pub hidden: usize,
}

impl RootNotice {
    pub fn message(&self) -> String {
        format!("...and {} more (close/reopen to see more)", self.hidden)
    }
}

/// Result of one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeView {
    pub roots: Vec<RenderNode>,
    pub notice: Option<RootNotice>,
    /// The data was a scalar; nothing could be rendered.
    pub no_data: bool,
}

pub(crate) fn render_root(
    renderer: &mut Renderer<'_>,
    data: &Value,
    id_field: &str,
    limits: &Limits,
    node_colors: Option<&IndexMap<String, String>>,
) -> TreeView {
    let Some(entries) = top_level_entries(data, id_field) else {
        return TreeView {
            no_data: true,
            ..TreeView::default()
        };
    };

    let cap = if data.is_array() {
        limits.root_array_entries
    } else {
        limits.root_object_entries
    };
    let total = entries.len();

    let mut roots = Vec::new();
    for (label, value) in entries.into_iter().take(cap) {
        let color = node_colors.and_then(|colors| colors.get(&label).cloned());
        let path = TreePath::root().child_key(label);
        if !renderer.push_child(&mut roots, path, value, 0, limits.max_depth, color) {
            break;
        }
    }

    let notice = (total > cap).then(|| RootNotice { hidden: total - cap });
    if let Some(notice) = notice {
        debug!(total, cap, hidden = notice.hidden, "top-level entries capped");
    }

    TreeView {
        roots,
        notice,
        no_data: false,
    }
}
