//! Application state for the variable picker.
//!
//! `App` owns the document, the caller's selection, and the engine's
//! [`TreeBrowser`]. Components read the flattened rows from here and call the
//! action helpers; anything that has to leave the synchronous update path
//! (persisting preferences, quitting) is returned as an [`Effect`].

use std::sync::Arc;

use indexmap::IndexMap;
use ryvr_engine::rows::{MARKER_COLLAPSED, MARKER_EXPANDED};
use ryvr_engine::{
    ActionOutcome, JsonKind, NodeAction, Refusal, RowStyle, SelectionSet, TreeBrowser, TreeInput, TreePath, TreeRow, flatten,
};
use ryvr_util::UserPreferences;
use serde_json::Value;
use tracing::{debug, info};

use crate::BrowseSession;
use crate::ui::theme::{self, LoadedTheme, Theme, ThemeDefinition, catalog};

/// Messages delivered to the app outside of direct key handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Resize(u16, u16),
    /// A background preferences write finished.
    PreferencesSaved(Result<String, String>),
}

/// Side effects requested by components and executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the active theme id as the preferred theme.
    SaveThemePreference(String),
    Exit(ExitReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub level: StatusLevel,
}

/// Inline search box state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub term: String,
    pub editing: bool,
}

pub struct App {
    data: Value,
    browser: TreeBrowser,
    node_colors: IndexMap<String, String>,
    pub selection: SelectionSet,
    pub search: SearchState,
    pub rows: Vec<TreeRow>,
    pub cursor: usize,
    pub theme: Box<dyn Theme>,
    pub theme_definition: &'static ThemeDefinition,
    pub preferences: Arc<UserPreferences>,
    pub status: Option<StatusLine>,
    pub exit: Option<ExitReason>,
}

impl App {
    pub fn new(session: BrowseSession, loaded_theme: LoadedTheme) -> Self {
        let BrowseSession {
            data,
            selection,
            options,
            search,
            node_colors,
            preferences,
        } = session;
        let mut app = Self {
            data,
            browser: TreeBrowser::new(options),
            node_colors,
            selection,
            search: SearchState {
                term: search,
                editing: false,
            },
            rows: Vec::new(),
            cursor: 0,
            theme: loaded_theme.theme,
            theme_definition: loaded_theme.definition,
            preferences,
            status: None,
            exit: None,
        };
        app.refresh();
        app
    }

    /// Re-renders the tree, keeping the cursor on the same path when it is
    /// still visible.
    pub fn refresh(&mut self) {
        let anchor = self.current_row().and_then(|row| row.path.clone());
        let input = TreeInput::new(&self.data, &self.selection)
            .with_search(&self.search.term)
            .with_node_colors(&self.node_colors);
        let view = self.browser.render(&input);
        self.rows = flatten(&view);

        if let Some(anchor) = anchor
            && let Some(index) = self.rows.iter().position(|row| row.path.as_ref() == Some(&anchor))
        {
            self.cursor = index;
        }
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn current_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.cursor)
    }

    /// Value under the cursor, if the row addresses one.
    pub fn current_value(&self) -> Option<&Value> {
        let path = self.current_row()?.path.as_ref()?;
        let input = TreeInput::new(&self.data, &self.selection);
        self.browser.resolve(&input, path)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn jump_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn jump_to_end(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
    }

    /// Runs the row's action: toggle, select, load more, or load deeper.
    pub fn activate_current(&mut self) {
        let Some(action) = self.current_row().and_then(|row| row.action.clone()) else {
            return;
        };
        self.apply_action(&action);
    }

    /// Expands a collapsed container, or triggers an affordance row.
    pub fn expand_current(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        match (row.marker, row.style) {
            (MARKER_COLLAPSED, _) | (_, RowStyle::Affordance) => self.activate_current(),
            (MARKER_EXPANDED, _) => self.move_cursor(1),
            _ => {}
        }
    }

    /// Collapses an expanded container, or moves to the parent row.
    pub fn collapse_current(&mut self) {
        let Some((marker, depth)) = self.current_row().map(|row| (row.marker, row.depth)) else {
            return;
        };
        if marker == MARKER_EXPANDED {
            self.activate_current();
            return;
        }
        if let Some(parent) = self.rows[..self.cursor]
            .iter()
            .rposition(|candidate| candidate.depth < depth && candidate.path.is_some())
        {
            self.cursor = parent;
        }
    }

    pub fn apply_action(&mut self, action: &NodeAction) {
        let outcome = {
            let input = TreeInput::new(&self.data, &self.selection).with_search(&self.search.term);
            self.browser.apply(action, &input)
        };
        match outcome {
            ActionOutcome::Updated => {
                self.status = None;
                self.refresh();
            }
            ActionOutcome::PathToggled(path) => self.toggle_selection(&path),
            ActionOutcome::Refused(refusal) => {
                if refusal == Refusal::Stale {
                    self.refresh();
                }
                self.set_status(refusal_message(&refusal), StatusLevel::Warning);
            }
        }
    }

    fn toggle_selection(&mut self, path: &TreePath) {
        let key = path.to_string();
        let selected = self.selection.toggle(&key);
        info!(path = %key, selected, "selection changed");
        let verb = if selected { "Selected" } else { "Deselected" };
        self.set_status(format!("{verb} {key}"), StatusLevel::Info);
        self.refresh();
    }

    pub fn begin_search(&mut self) {
        self.search.editing = true;
    }

    pub fn push_search_char(&mut self, character: char) {
        self.search.term.push(character);
        self.refresh();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.term.pop().is_some() {
            self.refresh();
        }
    }

    /// Leaves the search box, keeping the term.
    pub fn commit_search(&mut self) {
        self.search.editing = false;
    }

    pub fn clear_search(&mut self) {
        self.search.editing = false;
        if !self.search.term.is_empty() {
            self.search.term.clear();
            self.refresh();
        }
    }

    /// Switches to the next theme and returns the effect that persists it.
    pub fn cycle_theme(&mut self) -> Effect {
        let ansi_only = self.theme_definition.is_ansi_fallback
            && theme::detect_color_capability() == theme::ColorCapability::Ansi256;
        let next = catalog::next_after(self.theme_definition.id, ansi_only);
        let loaded = LoadedTheme::from_definition(next);
        debug!(theme = next.id, "theme changed");
        self.theme = loaded.theme;
        self.theme_definition = loaded.definition;
        self.set_status(format!("Theme: {}", next.label), StatusLevel::Info);
        Effect::SaveThemePreference(next.id.to_string())
    }

    pub fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusLine {
            message: message.into(),
            level,
        });
    }

    pub fn update(&mut self, msg: &Msg) {
        match msg {
            Msg::Resize(..) => {}
            Msg::PreferencesSaved(Ok(theme_id)) => debug!(theme = %theme_id, "theme preference saved"),
            Msg::PreferencesSaved(Err(error)) => {
                self.set_status(format!("Could not save preferences: {error}"), StatusLevel::Error);
            }
        }
    }

    /// Kind of the value under the cursor.
    pub fn current_kind(&self) -> Option<JsonKind> {
        match self.current_row()?.style {
            RowStyle::Value(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn finish(&mut self, reason: ExitReason) {
        self.exit = Some(reason);
    }

    pub fn into_selection(self) -> SelectionSet {
        self.selection
    }
}

fn refusal_message(refusal: &Refusal) -> String {
    match refusal {
        Refusal::ContainsSelection => "Cannot collapse: a selected path is inside this node".to_string(),
        Refusal::NotSelectable(reason) => format!("Cannot select: {reason}"),
        Refusal::NothingMoreToLoad => "Nothing more to load".to_string(),
        Refusal::Stale => "That node is no longer visible".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryvr_engine::BrowserOptions;
    use serde_json::json;

    fn app_for(data: Value, selection: SelectionSet) -> App {
        let session = BrowseSession {
            data,
            selection,
            options: BrowserOptions::default(),
            search: String::new(),
            node_colors: IndexMap::new(),
            preferences: Arc::new(UserPreferences::ephemeral()),
        };
        App::new(session, LoadedTheme::from_definition(catalog::default_truecolor()))
    }

    fn cursor_to(app: &mut App, label: &str) {
        app.cursor = app
            .rows
            .iter()
            .position(|row| row.label == label)
            .unwrap_or_else(|| panic!("no row labelled {label}"));
    }

    #[test]
    fn activating_a_leaf_toggles_the_selection() {
        let mut app = app_for(json!({ "user": { "name": "Ada" } }), SelectionSet::new());
        cursor_to(&mut app, "name");
        app.activate_current();
        assert!(app.selection.contains("user.name"));
        assert_eq!(app.current_row().map(|row| row.marker), Some("[x]"));

        app.activate_current();
        assert!(app.selection.is_empty());
    }

    #[test]
    fn collapse_is_refused_while_holding_a_selection() {
        let mut app = app_for(
            json!({ "user": { "name": "Ada" } }),
            SelectionSet::from_paths(["user.name"]),
        );
        cursor_to(&mut app, "user");
        app.collapse_current();
        assert_eq!(app.current_row().map(|row| row.marker), Some(MARKER_EXPANDED));
        let status = app.status.clone().expect("status message");
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.message.starts_with("Cannot collapse"));
    }

    #[test]
    fn collapse_then_expand_keeps_cursor_on_the_node() {
        let mut app = app_for(json!({ "user": { "name": "Ada" }, "total": 1 }), SelectionSet::new());
        cursor_to(&mut app, "user");
        app.collapse_current();
        assert_eq!(app.current_row().map(|row| row.marker), Some(MARKER_COLLAPSED));
        assert!(!app.rows.iter().any(|row| row.label == "name"));

        app.expand_current();
        assert_eq!(app.current_row().map(|row| row.label.as_str()), Some("user"));
        assert!(app.rows.iter().any(|row| row.label == "name"));
    }

    #[test]
    fn left_on_a_leaf_moves_to_the_parent() {
        let mut app = app_for(json!({ "user": { "name": "Ada", "age": 36 } }), SelectionSet::new());
        cursor_to(&mut app, "age");
        app.collapse_current();
        assert_eq!(app.current_row().map(|row| row.label.as_str()), Some("user"));
    }

    #[test]
    fn load_more_row_reveals_hidden_items() {
        let items: Vec<u32> = (0..25).collect();
        let mut app = app_for(json!({ "items": items }), SelectionSet::new());
        let visible_before = app.rows.iter().filter(|row| row.depth == 1 && row.path.is_some()).count();
        assert_eq!(visible_before, 10);

        cursor_to(&mut app, "load 10 more items (15 hidden)");
        app.activate_current();
        let visible_after = app.rows.iter().filter(|row| row.depth == 1 && row.path.is_some()).count();
        assert_eq!(visible_after, 20);
    }

    #[test]
    fn search_filters_rows_and_clearing_restores_them() {
        let mut app = app_for(json!({ "email": "a@b.c", "phone": "555" }), SelectionSet::new());
        app.begin_search();
        for character in "mail".chars() {
            app.push_search_char(character);
        }
        assert!(app.rows.iter().any(|row| row.label == "email"));
        assert!(!app.rows.iter().any(|row| row.label == "phone"));

        app.clear_search();
        assert!(!app.search.editing);
        assert!(app.rows.iter().any(|row| row.label == "phone"));
    }

    #[test]
    fn cycling_the_theme_requests_persistence() {
        let mut app = app_for(json!({ "a": 1 }), SelectionSet::new());
        let effect = app.cycle_theme();
        assert_eq!(effect, Effect::SaveThemePreference("nord".to_string()));
        assert_eq!(app.theme_definition.id, "nord");
    }

    #[test]
    fn cursor_is_clamped_to_rows() {
        let mut app = app_for(json!({ "a": 1, "b": 2 }), SelectionSet::new());
        app.move_cursor(10);
        assert_eq!(app.cursor, 1);
        app.move_cursor(-10);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn scalar_document_shows_no_data_row() {
        let app = app_for(json!(42), SelectionSet::new());
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.current_value(), None);
    }
}
