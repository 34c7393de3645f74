//! Flat rows for front ends.
//!
//! The render tree is walked depth-first into [`TreeRow`]s. Each row knows
//! how to draw itself (marker, label, preview, style class) and which
//! [`NodeAction`] activating it should trigger.

use ryvr_types::{JsonKind, LOAD_MORE_STEP, TreePath};

use crate::browser::NodeAction;
use crate::render::{EntryNode, RenderNode};
use crate::root::{NO_DATA_MESSAGE, TreeView};

pub const MARKER_EXPANDED: &str = "▾";
pub const MARKER_COLLAPSED: &str = "▸";
pub const MARKER_SELECTED: &str = "[x]";
pub const MARKER_UNSELECTED: &str = "[ ]";
pub const MARKER_MORE: &str = "+";
pub const MARKER_DEEPER: &str = "↓";
pub const MARKER_ERROR: &str = "!";

/// Visual class of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Value(JsonKind),
    Affordance,
    Error,
    Notice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub marker: &'static str,
    pub label: String,
    pub preview: Option<String>,
    pub style: RowStyle,
    pub color: Option<String>,
    pub selected: bool,
    pub path: Option<TreePath>,
    pub action: Option<NodeAction>,
}

impl TreeRow {
    fn info(depth: usize, marker: &'static str, label: String, style: RowStyle) -> Self {
        Self {
            depth,
            marker,
            label,
            preview: None,
            style,
            color: None,
            selected: false,
            path: None,
            action: None,
        }
    }
}

/// Walks the view into display order.
pub fn flatten(view: &TreeView) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    if view.no_data {
        rows.push(TreeRow::info(0, "", NO_DATA_MESSAGE.to_string(), RowStyle::Notice));
        return rows;
    }
    for node in &view.roots {
        push_node(node, &mut rows);
    }
    if let Some(notice) = view.notice {
        rows.push(TreeRow::info(0, "", notice.message(), RowStyle::Notice));
    }
    rows
}

fn push_node(node: &RenderNode, rows: &mut Vec<TreeRow>) {
    match node {
        RenderNode::Entry(entry) => {
            rows.push(entry_row(entry));
            for child in &entry.children {
                push_node(child, rows);
            }
        }
        RenderNode::MoreChildren {
            owner,
            kind,
            depth,
            hidden,
            total,
        } => {
            let noun = if *kind == JsonKind::Array { "items" } else { "properties" };
            let next = (*hidden).min(LOAD_MORE_STEP);
            let mut row = TreeRow::info(
                *depth,
                MARKER_MORE,
                format!("load {next} more {noun} ({hidden} hidden)"),
                RowStyle::Affordance,
            );
            row.action = Some(NodeAction::LoadMore {
                node: owner.clone(),
                kind: *kind,
                total: *total,
            });
            rows.push(row);
        }
        RenderNode::DepthLimit { owner, depth } => {
            let mut row = TreeRow::info(*depth, MARKER_DEEPER, "load deeper".to_string(), RowStyle::Affordance);
            row.action = Some(NodeAction::LoadDeeper(owner.clone()));
            rows.push(row);
        }
        RenderNode::Error { path, depth, message, .. } => {
            let mut row = TreeRow::info(*depth, MARKER_ERROR, message.clone(), RowStyle::Error);
            row.path = Some(path.clone());
            rows.push(row);
        }
    }
}

fn entry_row(entry: &EntryNode) -> TreeRow {
    let (marker, action) = match (&entry.key, entry.expandable) {
        (Some(key), true) => {
            let marker = if entry.expanded { MARKER_EXPANDED } else { MARKER_COLLAPSED };
            (marker, NodeAction::Toggle(key.clone()))
        }
        _ => {
            let marker = if entry.selected { MARKER_SELECTED } else { MARKER_UNSELECTED };
            (marker, NodeAction::Select(entry.path.clone()))
        }
    };
    TreeRow {
        depth: entry.depth,
        marker,
        label: entry.label.clone(),
        preview: Some(entry.preview.clone()),
        style: RowStyle::Value(entry.kind),
        color: entry.color.clone(),
        selected: entry.selected,
        path: Some(entry.path.clone()),
        action: Some(action),
    }
}

/// Plain-text rendering, two spaces of indent per level.
pub fn render_text(rows: &[TreeRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&"  ".repeat(row.depth));
        if !row.marker.is_empty() {
            out.push_str(row.marker);
            out.push(' ');
        }
        out.push_str(&row.label);
        if let Some(preview) = &row.preview {
            out.push_str(": ");
            out.push_str(preview);
        }
        out.push('\n');
    }
    out
}
