//! # RYVR Tree Engine
//!
//! A framework-independent view model for browsing arbitrary JSON workflow
//! output and picking "variable paths" out of it.
//!
//! Rendering is a pure recursive transform from a `serde_json::Value` into a
//! tree of [`RenderNode`] commands. A separate flat walk ([`flatten`]) turns
//! that tree into rows for a terminal or a plain-text printer. Per-node
//! expansion state lives in an arena keyed by [`NodeKey`] inside
//! [`TreeBrowser`]; the selection set is always owned by the caller.
//!
//! ## Usage
//!
//! ```rust
//! use ryvr_engine::{SelectionSet, TreeBrowser, TreeInput, flatten, render_text};
//! use serde_json::json;
//!
//! let data = json!({ "fetch": { "status": 200, "items": [1, 2] } });
//! let selection = SelectionSet::default();
//! let mut browser = TreeBrowser::default();
//! let view = browser.render(&TreeInput::new(&data, &selection));
//! println!("{}", render_text(&flatten(&view)));
//! ```
//!
//! ## Architecture
//!
//! - **`classify`** / **`preview`**: pure helpers for kinds and bounded previews
//! - **`selection`**: the caller-owned set of selected leaf paths
//! - **`search`**: shallow key/value filter
//! - **`state`**: per-node expansion state and its arena
//! - **`render`**: the bounded recursive node renderer
//! - **`root`**: top-level dispatch and root caps
//! - **`browser`**: the facade tying state, rendering and actions together
//! - **`rows`**: flat rows for front ends
//! - **`field_paths`**: leaf enumeration and path resolution

pub mod browser;
pub mod classify;
pub mod field_paths;
pub mod preview;
pub mod render;
pub mod root;
pub mod rows;
pub mod search;
pub mod selection;
pub mod state;

pub use browser::{ActionOutcome, BrowserOptions, NodeAction, Refusal, TreeBrowser, TreeInput};
pub use classify::classify;
pub use field_paths::{SelectionPathError, leaf_paths, resolve_entry, top_level_entries, validate_selection};
pub use preview::preview;
pub use render::{EntryNode, RENDER_ERROR_MESSAGE, RenderError, RenderNode};
pub use root::{NO_DATA_MESSAGE, RootNotice, TreeView};
pub use rows::{RowStyle, TreeRow, flatten, render_text};
pub use search::matches;
pub use selection::SelectionSet;
pub use state::{NodeKey, NodeState, ToggleOutcome};

pub use ryvr_types::{JsonKind, Limits, PathSegment, TreePath};
