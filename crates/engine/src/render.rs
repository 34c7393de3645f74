//! Bounded recursive node renderer.
//!
//! Turns a JSON value into a tree of [`RenderNode`] commands. Recursion stops
//! at each node's depth limit, sibling lists stop at the item/property caps,
//! and a per-pass budget bounds the total work. A failing subtree is replaced
//! by an inline [`RenderNode::Error`] so the rest of the view still renders.

use ryvr_types::{JsonKind, Limits, TreePath};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::preview::preview;
use crate::search;
use crate::selection::SelectionSet;
use crate::state::{ExpansionArena, NodeKey, NodeState};

/// Message shown in place of a subtree that failed to render.
pub const RENDER_ERROR_MESSAGE: &str = "Error rendering content — try refreshing";

/// Default cap on nodes built in a single render pass.
pub const DEFAULT_MAX_RENDERED_NODES: usize = 5_000;

/// Default depth past which no node is built, regardless of relaxed limits.
pub const DEFAULT_DEPTH_CEILING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("'{path}' is {depth} levels deep, past the ceiling of {ceiling}")]
    DepthCeiling { path: String, depth: usize, ceiling: usize },
    #[error("render budget of {budget} nodes exhausted at '{path}'")]
    BudgetExhausted { path: String, budget: usize },
}

impl RenderError {
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, RenderError::BudgetExhausted { .. })
    }
}

/// A key/value pair in the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryNode {
    /// Present for containers only; leaves carry no expansion state.
    pub key: Option<NodeKey>,
    pub path: TreePath,
    pub label: String,
    pub kind: JsonKind,
    pub preview: String,
    pub depth: usize,
    pub expandable: bool,
    pub expanded: bool,
    /// Leaf is in the selection set. Always `false` for containers.
    pub selected: bool,
    /// Container holds a selected descendant.
    pub contains_selection: bool,
    /// Display color for top-level nodes, taken from the caller's mapping.
    pub color: Option<String>,
    pub children: Vec<RenderNode>,
}

/// One command in the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Entry(EntryNode),
    /// Children hidden by the owner's item or property cap.
    MoreChildren {
        owner: NodeKey,
        kind: JsonKind,
        depth: usize,
        hidden: usize,
        total: usize,
    },
    /// The owner reached its depth limit; children are not built.
    DepthLimit { owner: NodeKey, depth: usize },
    Error {
        path: TreePath,
        depth: usize,
        message: String,
        detail: String,
    },
}

impl RenderNode {
    pub fn as_entry(&self) -> Option<&EntryNode> {
        match self {
            RenderNode::Entry(entry) => Some(entry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RenderBudget {
    budget: usize,
    remaining: usize,
    depth_ceiling: usize,
}

impl RenderBudget {
    pub(crate) fn new(budget: usize, depth_ceiling: usize) -> Self {
        Self {
            budget,
            remaining: budget,
            depth_ceiling,
        }
    }

    fn charge(&mut self, path: &TreePath, depth: usize) -> Result<(), RenderError> {
        if depth > self.depth_ceiling {
            return Err(RenderError::DepthCeiling {
                path: path.to_string(),
                depth,
                ceiling: self.depth_ceiling,
            });
        }
        if self.remaining == 0 {
            return Err(RenderError::BudgetExhausted {
                path: path.to_string(),
                budget: self.budget,
            });
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Single render pass over one input.
pub(crate) struct Renderer<'a> {
    pub(crate) arena: &'a mut ExpansionArena,
    pub(crate) selection: &'a SelectionSet,
    pub(crate) search: &'a str,
    pub(crate) limits: &'a Limits,
    pub(crate) budget: RenderBudget,
}

impl Renderer<'_> {
    /// Renders one child into `out`, substituting an error node on failure.
    ///
    /// Returns `false` once the pass budget is gone so callers stop walking
    /// their remaining siblings.
    pub(crate) fn push_child(
        &mut self,
        out: &mut Vec<RenderNode>,
        path: TreePath,
        value: &Value,
        depth: usize,
        inherited_depth_limit: usize,
        color: Option<String>,
    ) -> bool {
        match self.render_entry(&path, value, depth, inherited_depth_limit, color) {
            Ok(Some(node)) => {
                out.push(node);
                true
            }
            Ok(None) => true,
            Err(error) => {
                warn!(path = %path, error = %error, "failed to render subtree");
                let keep_going = !error.is_budget_exhausted();
                out.push(RenderNode::Error {
                    path,
                    depth,
                    message: RENDER_ERROR_MESSAGE.to_string(),
                    detail: error.to_string(),
                });
                keep_going
            }
        }
    }

    fn render_entry(
        &mut self,
        path: &TreePath,
        value: &Value,
        depth: usize,
        inherited_depth_limit: usize,
        color: Option<String>,
    ) -> Result<Option<RenderNode>, RenderError> {
        let label = path.label();
        let kind = classify(Some(value));
        let expandable = kind.is_expandable();
        if !expandable && !search::matches(&label, Some(value), self.search) {
            return Ok(None);
        }
        self.budget.charge(path, depth)?;

        let path_text = path.to_string();
        let preview = preview(Some(value), kind);

        if !expandable {
            let selected = self.selection.contains(&path_text);
            return Ok(Some(RenderNode::Entry(EntryNode {
                key: None,
                path: path.clone(),
                label,
                kind,
                preview,
                depth,
                expandable,
                expanded: false,
                selected,
                contains_selection: selected,
                color,
                children: Vec::new(),
            })));
        }

        let key = NodeKey::new(path_text.as_str(), inherited_depth_limit);
        let contains_selection = self.selection.has_selected_descendant(&path_text);
        let state = self.arena.mount(&key, depth, self.limits);
        if state.apply_auto_expand(contains_selection) {
            debug!(path = %path_text, "expanded to reveal a selected descendant");
        }
        let state = state.clone();

        let children = if !state.is_expanded() {
            Vec::new()
        } else if depth >= state.depth_limit() {
            vec![RenderNode::DepthLimit {
                owner: key.clone(),
                depth: depth + 1,
            }]
        } else {
            self.render_children(&key, path, value, depth, &state)
        };

        Ok(Some(RenderNode::Entry(EntryNode {
            key: Some(key),
            path: path.clone(),
            label,
            kind,
            preview,
            depth,
            expandable,
            expanded: state.is_expanded(),
            selected: false,
            contains_selection,
            color,
            children,
        })))
    }

    fn render_children(&mut self, owner: &NodeKey, path: &TreePath, value: &Value, depth: usize, state: &NodeState) -> Vec<RenderNode> {
        let child_depth = depth + 1;
        let inherited = state.depth_limit();
        let mut out = Vec::new();

        let (kind, total, limit) = match value {
            Value::Array(items) => {
                let limit = state.item_limit();
                for (index, item) in items.iter().take(limit).enumerate() {
                    if !self.push_child(&mut out, path.child_index(index), item, child_depth, inherited, None) {
                        break;
                    }
                }
                (JsonKind::Array, items.len(), limit)
            }
            Value::Object(map) => {
                let limit = state.prop_limit();
                for (key, item) in map.iter().take(limit) {
                    if !self.push_child(&mut out, path.child_key(key.as_str()), item, child_depth, inherited, None) {
                        break;
                    }
                }
                (JsonKind::Object, map.len(), limit)
            }
            _ => return out,
        };

        if total > limit {
            out.push(RenderNode::MoreChildren {
                owner: owner.clone(),
                kind,
                depth: child_depth,
                hidden: total - limit,
                total,
            });
        }
        out
    }
}
