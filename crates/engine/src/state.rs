//! Per-node expansion state and the arena that owns it.
//!
//! State is created the first time a node is rendered and dropped at the end
//! of any render pass that did not visit it, which mirrors a UI component
//! being mounted and unmounted.

use std::collections::{HashMap, HashSet};

use ryvr_types::{LOAD_DEEPER_STEP, LOAD_MORE_STEP, Limits};
use tracing::trace;

/// Depth below which nodes start out expanded.
pub const DEFAULT_EXPANDED_DEPTH: usize = 2;

/// Identity of a rendered container node.
///
/// The inherited depth limit is part of the key: when an ancestor relaxes
/// its depth limit every descendant gets a new key and therefore fresh,
/// default state instead of whatever it held under the old limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    path: String,
    inherited_depth_limit: usize,
}

impl NodeKey {
    pub fn new(path: impl Into<String>, inherited_depth_limit: usize) -> Self {
        Self {
            path: path.into(),
            inherited_depth_limit,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn inherited_depth_limit(&self) -> usize {
        self.inherited_depth_limit
    }
}

/// Result of a user toggle on a container node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Collapsed,
    /// Collapse refused because a selected path lives inside the node.
    Refused,
}

/// Ephemeral state of one container node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    expanded: bool,
    manually_expanded: bool,
    manually_collapsed: bool,
    auto_expanded: bool,
    depth_limit: usize,
    item_limit: usize,
    prop_limit: usize,
}

impl NodeState {
    pub fn new(depth: usize, inherited_depth_limit: usize, limits: &Limits) -> Self {
        Self {
            expanded: depth < DEFAULT_EXPANDED_DEPTH,
            manually_expanded: false,
            manually_collapsed: false,
            auto_expanded: false,
            depth_limit: inherited_depth_limit,
            item_limit: limits.max_array_items,
            prop_limit: limits.max_object_props,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_manually_expanded(&self) -> bool {
        self.manually_expanded
    }

    pub fn is_manually_collapsed(&self) -> bool {
        self.manually_collapsed
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    pub fn item_limit(&self) -> usize {
        self.item_limit
    }

    pub fn prop_limit(&self) -> usize {
        self.prop_limit
    }

    /// Flips expansion. Collapsing is refused while `contains_selection`.
    pub fn toggle(&mut self, contains_selection: bool) -> ToggleOutcome {
        if self.expanded {
            if contains_selection {
                return ToggleOutcome::Refused;
            }
            self.expanded = false;
            self.manually_expanded = false;
            self.manually_collapsed = true;
            ToggleOutcome::Collapsed
        } else {
            self.expanded = true;
            self.manually_expanded = true;
            self.manually_collapsed = false;
            ToggleOutcome::Expanded
        }
    }

    /// Expands once when a selection appears inside a collapsed node.
    ///
    /// Suppressed while the user's last action on the node was a collapse.
    /// The one-shot flag re-arms when the selection leaves the subtree.
    /// Returns `true` when the node was expanded by this call.
    pub fn apply_auto_expand(&mut self, contains_selection: bool) -> bool {
        if !contains_selection {
            self.auto_expanded = false;
            return false;
        }
        if self.expanded || self.auto_expanded || self.manually_collapsed {
            return false;
        }
        self.expanded = true;
        self.auto_expanded = true;
        true
    }

    /// Relaxes the depth limit and pins the node open.
    pub fn load_deeper(&mut self) -> usize {
        self.depth_limit += LOAD_DEEPER_STEP;
        self.expanded = true;
        self.manually_expanded = true;
        self.manually_collapsed = false;
        self.depth_limit
    }

    /// Reveals up to ten more array items. Returns `None` when nothing is hidden.
    pub fn load_more_items(&mut self, total: usize) -> Option<usize> {
        Self::bump(&mut self.item_limit, total)
    }

    /// Reveals up to ten more object properties. Returns `None` when nothing is hidden.
    pub fn load_more_props(&mut self, total: usize) -> Option<usize> {
        Self::bump(&mut self.prop_limit, total)
    }

    fn bump(limit: &mut usize, total: usize) -> Option<usize> {
        let remaining = total.saturating_sub(*limit);
        if remaining == 0 {
            return None;
        }
        *limit += remaining.min(LOAD_MORE_STEP);
        Some(*limit)
    }
}

/// Owner of every live [`NodeState`].
#[derive(Debug, Default)]
pub struct ExpansionArena {
    nodes: HashMap<NodeKey, NodeState>,
    visited: HashSet<NodeKey>,
}

impl ExpansionArena {
    pub fn begin_pass(&mut self) {
        self.visited.clear();
    }

    /// Returns the state for `key`, creating it with defaults on first mount.
    pub fn mount(&mut self, key: &NodeKey, depth: usize, limits: &Limits) -> &mut NodeState {
        self.visited.insert(key.clone());
        self.nodes
            .entry(key.clone())
            .or_insert_with(|| NodeState::new(depth, key.inherited_depth_limit, limits))
    }

    /// Drops state for nodes the finished pass did not render.
    pub fn end_pass(&mut self) {
        let before = self.nodes.len();
        let visited = &self.visited;
        self.nodes.retain(|key, _| visited.contains(key));
        let unmounted = before - self.nodes.len();
        if unmounted > 0 {
            trace!(unmounted, live = self.nodes.len(), "dropped state for unmounted nodes");
        }
    }

    pub fn get(&self, key: &NodeKey) -> Option<&NodeState> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &NodeKey) -> Option<&mut NodeState> {
        self.nodes.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.visited.clear();
    }
}
