//! The tree browser facade.
//!
//! `TreeBrowser` owns the expansion arena and nothing else. Each call to
//! [`TreeBrowser::render`] takes a fresh snapshot of the caller's data,
//! selection and search term. User interaction comes back through
//! [`TreeBrowser::apply`]; selection toggles are returned as intents for the
//! caller to apply to its own [`SelectionSet`].

use indexmap::IndexMap;
use ryvr_types::{JsonKind, Limits, TreePath};
use serde_json::Value;
use tracing::debug;

use crate::field_paths::{resolve_entry, validate_selection};
use crate::render::{DEFAULT_DEPTH_CEILING, DEFAULT_MAX_RENDERED_NODES, RenderBudget, Renderer};
use crate::root::{TreeView, render_root};
use crate::selection::SelectionSet;
use crate::state::{ExpansionArena, NodeKey, NodeState, ToggleOutcome};

/// Tunables for a browser instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub limits: Limits,
    /// Field used to label records when the data is an array.
    pub record_id_field: String,
    pub max_rendered_nodes: usize,
    pub depth_ceiling: usize,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            record_id_field: "id".to_string(),
            max_rendered_nodes: DEFAULT_MAX_RENDERED_NODES,
            depth_ceiling: DEFAULT_DEPTH_CEILING,
        }
    }
}

/// Read-only snapshot handed to a render pass.
#[derive(Debug, Clone, Copy)]
pub struct TreeInput<'a> {
    data: &'a Value,
    selection: &'a SelectionSet,
    search: &'a str,
    node_colors: Option<&'a IndexMap<String, String>>,
}

impl<'a> TreeInput<'a> {
    pub fn new(data: &'a Value, selection: &'a SelectionSet) -> Self {
        Self {
            data,
            selection,
            search: "",
            node_colors: None,
        }
    }

    pub fn with_search(mut self, search: &'a str) -> Self {
        self.search = search;
        self
    }

    pub fn with_node_colors(mut self, node_colors: &'a IndexMap<String, String>) -> Self {
        self.node_colors = Some(node_colors);
        self
    }

    pub fn data(&self) -> &'a Value {
        self.data
    }

    pub fn selection(&self) -> &'a SelectionSet {
        self.selection
    }
}

/// A user interaction on a rendered node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    /// Expand or collapse a container.
    Toggle(NodeKey),
    /// Reveal more hidden children of a container.
    LoadMore { node: NodeKey, kind: JsonKind, total: usize },
    /// Relax a container's depth limit.
    LoadDeeper(NodeKey),
    /// Select or deselect a leaf.
    Select(TreePath),
}

/// Why an action changed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// Collapsing would hide a selected path.
    ContainsSelection,
    /// The path is a container or does not exist.
    NotSelectable(String),
    NothingMoreToLoad,
    /// The node is no longer mounted.
    Stale,
}

/// Result of [`TreeBrowser::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Local state changed; render again.
    Updated,
    /// The caller should toggle this path in its selection set.
    PathToggled(TreePath),
    Refused(Refusal),
}

/// Stateful view model over caller-supplied JSON.
#[derive(Debug, Default)]
pub struct TreeBrowser {
    options: BrowserOptions,
    arena: ExpansionArena,
}

impl TreeBrowser {
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            arena: ExpansionArena::default(),
        }
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self::new(BrowserOptions {
            limits,
            ..BrowserOptions::default()
        })
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Renders the snapshot, mounting new nodes and unmounting unseen ones.
    pub fn render(&mut self, input: &TreeInput<'_>) -> TreeView {
        let limits = self.options.limits;
        self.arena.begin_pass();
        let view = {
            let mut renderer = Renderer {
                arena: &mut self.arena,
                selection: input.selection,
                search: input.search,
                limits: &limits,
                budget: RenderBudget::new(self.options.max_rendered_nodes, self.options.depth_ceiling),
            };
            render_root(&mut renderer, input.data, &self.options.record_id_field, &limits, input.node_colors)
        };
        self.arena.end_pass();
        view
    }

    /// Applies a user action against the current state.
    ///
    /// `input` must be the snapshot the action was produced from; it supplies
    /// the selection for the collapse guard and the data for leaf checks.
    pub fn apply(&mut self, action: &NodeAction, input: &TreeInput<'_>) -> ActionOutcome {
        match action {
            NodeAction::Toggle(key) => {
                let contains_selection = input.selection.contains_within(key.path());
                let Some(state) = self.arena.get_mut(key) else {
                    return ActionOutcome::Refused(Refusal::Stale);
                };
                match state.toggle(contains_selection) {
                    ToggleOutcome::Refused => {
                        debug!(path = key.path(), "collapse refused; node holds a selection");
                        ActionOutcome::Refused(Refusal::ContainsSelection)
                    }
                    ToggleOutcome::Expanded | ToggleOutcome::Collapsed => ActionOutcome::Updated,
                }
            }
            NodeAction::LoadMore { node, kind, total } => {
                let Some(state) = self.arena.get_mut(node) else {
                    return ActionOutcome::Refused(Refusal::Stale);
                };
                let bumped = match kind {
                    JsonKind::Array => state.load_more_items(*total),
                    JsonKind::Object => state.load_more_props(*total),
                    _ => None,
                };
                match bumped {
                    Some(limit) => {
                        debug!(path = node.path(), limit, total, "revealed more children");
                        ActionOutcome::Updated
                    }
                    None => ActionOutcome::Refused(Refusal::NothingMoreToLoad),
                }
            }
            NodeAction::LoadDeeper(key) => {
                let Some(state) = self.arena.get_mut(key) else {
                    return ActionOutcome::Refused(Refusal::Stale);
                };
                let limit = state.load_deeper();
                debug!(path = key.path(), depth_limit = limit, "relaxed depth limit");
                ActionOutcome::Updated
            }
            NodeAction::Select(path) => match validate_selection(input.data, path, &self.options.record_id_field) {
                Ok(()) => ActionOutcome::PathToggled(path.clone()),
                Err(error) => {
                    debug!(path = %path, error = %error, "selection refused");
                    ActionOutcome::Refused(Refusal::NotSelectable(error.to_string()))
                }
            },
        }
    }

    pub fn node_state(&self, key: &NodeKey) -> Option<&NodeState> {
        self.arena.get(key)
    }

    /// Number of mounted container nodes.
    pub fn mounted_nodes(&self) -> usize {
        self.arena.len()
    }

    /// Resolves a path against the snapshot using this browser's record labels.
    pub fn resolve<'a>(&self, input: &TreeInput<'a>, path: &TreePath) -> Option<&'a Value> {
        resolve_entry(input.data, path, &self.options.record_id_field)
    }

    /// Drops all expansion state, as if the view were closed and reopened.
    pub fn reset(&mut self) {
        self.arena.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RENDER_ERROR_MESSAGE, RenderNode};
    use serde_json::json;

    fn entry<'v>(nodes: &'v [RenderNode], label: &str) -> &'v crate::render::EntryNode {
        nodes
            .iter()
            .filter_map(RenderNode::as_entry)
            .find(|entry| entry.label == label)
            .unwrap_or_else(|| panic!("no entry labelled {label}"))
    }

    #[test]
    fn renders_nested_object_with_default_expansion() {
        let data = json!({ "a": { "b": 1, "c": [1, 2, 3, 4] } });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selection));

        let a = entry(&view.roots, "a");
        assert!(a.expandable);
        assert!(a.expanded);
        assert_eq!(a.preview, "{2 keys}");

        let b = entry(&a.children, "b");
        assert_eq!(b.preview, "1");
        assert!(!b.expandable);

        let c = entry(&a.children, "c");
        assert_eq!(c.preview, "Array(4)");
        assert_eq!(c.kind, JsonKind::Array);
        assert_eq!(c.children.len(), 4);
    }

    #[test]
    fn search_keeps_null_leaf_matched_by_key_in_any_case() {
        let data = json!({ "x": null, "y": 1 });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        for term in ["x", "X"] {
            let view = browser.render(&TreeInput::new(&data, &selection).with_search(term));
            assert_eq!(view.roots.len(), 1, "term {term}");
            let x = entry(&view.roots, "x");
            assert_eq!(x.preview, "null");
            assert_eq!(x.kind, JsonKind::Null);
        }
    }

    #[test]
    fn search_keeps_non_matching_containers() {
        let data = json!({ "outer": { "needle": 1, "hay": 2 } });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selection).with_search("need"));
        let outer = entry(&view.roots, "outer");
        assert_eq!(outer.children.len(), 1);
        entry(&outer.children, "needle");
    }

    #[test]
    fn rendering_twice_is_idempotent() {
        let data = json!({ "a": { "deep": { "deeper": { "x": 1 } } }, "list": [1, { "k": "v" }] });
        let selection = SelectionSet::from_paths(["a.deep.deeper.x"]);
        let mut browser = TreeBrowser::default();
        let input = TreeInput::new(&data, &selection).with_search("");
        let first = browser.render(&input);
        let second = browser.render(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn only_leaves_report_selection() {
        let data = json!({ "a": { "b": 1 } });
        let selection = SelectionSet::from_paths(["a", "a.b"]);
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selection));
        let a = entry(&view.roots, "a");
        assert!(!a.selected);
        assert!(a.contains_selection);
        assert!(entry(&a.children, "b").selected);

        let outcome = browser.apply(&NodeAction::Select("a".parse().expect("path")), &TreeInput::new(&data, &selection));
        assert!(matches!(outcome, ActionOutcome::Refused(Refusal::NotSelectable(_))));
        let outcome = browser.apply(&NodeAction::Select("a.b".parse().expect("path")), &TreeInput::new(&data, &selection));
        assert_eq!(outcome, ActionOutcome::PathToggled("a.b".parse().expect("path")));
    }

    #[test]
    fn collapse_is_refused_while_a_descendant_is_selected() {
        let data = json!({ "a": { "b": 1 } });
        let empty = SelectionSet::default();
        let selected = SelectionSet::from_paths(["a.b"]);
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selected));
        let key = entry(&view.roots, "a").key.clone().expect("container key");

        let outcome = browser.apply(&NodeAction::Toggle(key.clone()), &TreeInput::new(&data, &selected));
        assert_eq!(outcome, ActionOutcome::Refused(Refusal::ContainsSelection));
        assert!(browser.node_state(&key).expect("mounted").is_expanded());

        let outcome = browser.apply(&NodeAction::Toggle(key.clone()), &TreeInput::new(&data, &empty));
        assert_eq!(outcome, ActionOutcome::Updated);
        assert!(!browser.node_state(&key).expect("mounted").is_expanded());
    }

    #[test]
    fn selection_auto_expands_collapsed_ancestor_unless_manually_collapsed() {
        let data = json!({ "a": { "b": { "c": { "leaf": 1 } } } });
        let empty = SelectionSet::default();
        let selected = SelectionSet::from_paths(["a.b.c.leaf"]);
        let mut browser = TreeBrowser::default();

        let view = browser.render(&TreeInput::new(&data, &empty));
        let b = entry(&entry(&view.roots, "a").children, "b");
        let c = entry(&b.children, "c");
        assert!(!c.expanded, "depth 2 starts collapsed");

        let view = browser.render(&TreeInput::new(&data, &selected));
        let c = entry(&entry(&entry(&view.roots, "a").children, "b").children, "c");
        assert!(c.expanded, "selection inside should auto-expand");
        assert!(c.children.iter().filter_map(RenderNode::as_entry).any(|leaf| leaf.selected));

        // Deselect, collapse by hand, then select again: stays collapsed.
        let c_key = c.key.clone().expect("container key");
        browser.render(&TreeInput::new(&data, &empty));
        assert_eq!(browser.apply(&NodeAction::Toggle(c_key.clone()), &TreeInput::new(&data, &empty)), ActionOutcome::Updated);
        let view = browser.render(&TreeInput::new(&data, &selected));
        let c = entry(&entry(&entry(&view.roots, "a").children, "b").children, "c");
        assert!(!c.expanded, "manual collapse suppresses auto-expand");
    }

    #[test]
    fn load_more_reveals_hidden_array_items() {
        let items: Vec<u32> = (0..25).collect();
        let data = json!({ "items": items });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        let input = TreeInput::new(&data, &selection);

        let view = browser.render(&input);
        let list = entry(&view.roots, "items");
        let Some(RenderNode::MoreChildren { owner, kind, hidden, total, .. }) = list.children.last().cloned() else {
            panic!("expected a load-more row");
        };
        assert_eq!((hidden, total), (15, 25));
        assert_eq!(list.children.len(), 11);

        let action = NodeAction::LoadMore { node: owner.clone(), kind, total };
        assert_eq!(browser.apply(&action, &input), ActionOutcome::Updated);
        assert_eq!(browser.node_state(&owner).expect("mounted").item_limit(), 20);
        assert_eq!(browser.apply(&action, &input), ActionOutcome::Updated);
        assert_eq!(browser.node_state(&owner).expect("mounted").item_limit(), 25);
        assert_eq!(browser.apply(&action, &input), ActionOutcome::Refused(Refusal::NothingMoreToLoad));

        let view = browser.render(&input);
        let list = entry(&view.roots, "items");
        assert_eq!(list.children.len(), 25);
    }

    #[test]
    fn load_deeper_relaxes_limit_and_remounts_children() {
        let data = json!({ "l0": { "l1": { "l2": { "l3": { "l4": { "l5": { "leaf": true } } } } } } });
        let selection = SelectionSet::default();
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let mut browser = TreeBrowser::with_limits(limits);
        let input = TreeInput::new(&data, &selection);

        let view = browser.render(&input);
        let l1 = entry(&entry(&view.roots, "l0").children, "l1");
        let l2 = entry(&l1.children, "l2");
        let l2_key = l2.key.clone().expect("container key");
        assert!(!l2.expanded);

        assert_eq!(browser.apply(&NodeAction::Toggle(l2_key.clone()), &input), ActionOutcome::Updated);
        let view = browser.render(&input);
        let l2 = entry(&entry(&entry(&view.roots, "l0").children, "l1").children, "l2");
        assert!(matches!(l2.children.as_slice(), [RenderNode::DepthLimit { .. }]));

        let before = browser.node_state(&l2_key).expect("mounted").depth_limit();
        assert_eq!(browser.apply(&NodeAction::LoadDeeper(l2_key.clone()), &input), ActionOutcome::Updated);
        let state = browser.node_state(&l2_key).expect("mounted");
        assert!(state.depth_limit() > before);
        assert!(state.is_manually_expanded());

        let view = browser.render(&input);
        let l2 = entry(&entry(&entry(&view.roots, "l0").children, "l1").children, "l2");
        let l3 = entry(&l2.children, "l3");
        let l3_key = l3.key.clone().expect("container key");
        assert_eq!(l3_key.inherited_depth_limit(), before + ryvr_types::LOAD_DEEPER_STEP);
        assert!(!l3.expanded, "remounted child starts from defaults");
    }

    #[test]
    fn root_array_is_capped_without_building_hidden_records() {
        let records: Vec<Value> = (0..20).map(|index| json!({ "id": format!("step{index}"), "output": { "n": index } })).collect();
        let data = Value::Array(records);
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selection));

        assert_eq!(view.roots.len(), 8);
        let notice = view.notice.expect("root notice");
        assert_eq!(notice.hidden, 12);
        assert_eq!(notice.message(), "...and 12 more (close/reopen to see more)");
        assert_eq!(entry(&view.roots, "step0").label, "step0");
        // Each record mounts itself and its `output` object.
        assert_eq!(browser.mounted_nodes(), 16);
    }

    #[test]
    fn root_object_cap_and_colors() {
        let mut map = serde_json::Map::new();
        for index in 0..15 {
            map.insert(format!("k{index}"), json!(index));
        }
        let data = Value::Object(map);
        let selection = SelectionSet::default();
        let mut colors = IndexMap::new();
        colors.insert("k0".to_string(), "magenta".to_string());
        let mut browser = TreeBrowser::default();
        let view = browser.render(&TreeInput::new(&data, &selection).with_node_colors(&colors));
        assert_eq!(view.roots.len(), 12);
        assert_eq!(view.notice.map(|notice| notice.hidden), Some(3));
        assert_eq!(entry(&view.roots, "k0").color.as_deref(), Some("magenta"));
        assert_eq!(entry(&view.roots, "k1").color, None);
    }

    #[test]
    fn scalar_data_has_nothing_to_render() {
        let data = json!("just a string");
        let selection = SelectionSet::default();
        let view = TreeBrowser::default().render(&TreeInput::new(&data, &selection));
        assert!(view.no_data);
        assert!(view.roots.is_empty());
    }

    #[test]
    fn exhausted_budget_degrades_to_inline_error() {
        let data = json!({ "a": { "b": 1, "c": 2, "d": 3 }, "e": 4 });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::new(BrowserOptions {
            max_rendered_nodes: 3,
            ..BrowserOptions::default()
        });
        let view = browser.render(&TreeInput::new(&data, &selection));
        let a = entry(&view.roots, "a");
        let errors: Vec<&RenderNode> = a.children.iter().filter(|node| matches!(node, RenderNode::Error { .. })).collect();
        assert_eq!(errors.len(), 1);
        let RenderNode::Error { message, .. } = errors[0] else {
            unreachable!();
        };
        assert_eq!(message, RENDER_ERROR_MESSAGE);
        assert!(matches!(view.roots.last(), Some(RenderNode::Error { .. })));
    }

    #[test]
    fn collapsing_unmounts_descendant_state() {
        let data = json!({ "a": { "b": { "c": 1 } } });
        let selection = SelectionSet::default();
        let mut browser = TreeBrowser::default();
        let input = TreeInput::new(&data, &selection);
        let view = browser.render(&input);
        assert_eq!(browser.mounted_nodes(), 2);

        let a_key = entry(&view.roots, "a").key.clone().expect("container key");
        browser.apply(&NodeAction::Toggle(a_key), &input);
        browser.render(&input);
        assert_eq!(browser.mounted_nodes(), 1);
    }
}
