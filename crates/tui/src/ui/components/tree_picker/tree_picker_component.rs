//! Tree picker pane: the interactive variable picker.
//!
//! Renders the engine's flat rows as an indented tree next to a details
//! panel, with an inline search box above and key hints below. Keys map to
//! cursor movement and to the row actions exposed by [`App`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use ryvr_engine::rows::{MARKER_ERROR, MARKER_SELECTED, MARKER_UNSELECTED};
use ryvr_engine::{RowStyle, TreeRow};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Effect, ExitReason, StatusLevel};
use crate::ui::components::common::json_syntax::highlighted_json_lines;
use crate::ui::components::component::Component;
use crate::ui::theme::roles::Theme;
use crate::ui::theme::theme_helpers::{self as th, highlight_segments, parse_color, truncate_to_width};

const PAGE_STEP: isize = 10;
const SCROLL_STEP: isize = 3;

#[derive(Debug, Default)]
pub struct TreePickerComponent {
    /// First row drawn in the tree list.
    offset: usize,
    /// Inner area of the tree list from the last frame, for mouse hits.
    list_area: Rect,
}

impl TreePickerComponent {
    fn handle_search_keys(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter | KeyCode::Down => app.commit_search(),
            KeyCode::Esc => app.clear_search(),
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Char(character) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.push_search_char(character),
            _ => {}
        }
        Vec::new()
    }

    /// Keeps the cursor inside the visible window.
    fn scroll_to_cursor(&mut self, cursor: usize, height: usize) {
        if height == 0 {
            return;
        }
        if cursor < self.offset {
            self.offset = cursor;
        } else if cursor >= self.offset + height {
            self.offset = cursor + 1 - height;
        }
    }
}

impl Component for TreePickerComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.search.editing {
            return self.handle_search_keys(app, key);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
            KeyCode::PageUp => app.move_cursor(-PAGE_STEP),
            KeyCode::PageDown => app.move_cursor(PAGE_STEP),
            KeyCode::Home | KeyCode::Char('g') => app.jump_to_start(),
            KeyCode::End | KeyCode::Char('G') => app.jump_to_end(),
            KeyCode::Enter | KeyCode::Char(' ') => app.activate_current(),
            KeyCode::Right | KeyCode::Char('l') => app.expand_current(),
            KeyCode::Left | KeyCode::Char('h') => app.collapse_current(),
            KeyCode::Char('/') => app.begin_search(),
            KeyCode::Char('t') => return vec![app.cycle_theme()],
            KeyCode::Char('q') => return vec![Effect::Exit(ExitReason::Confirmed)],
            KeyCode::Esc => return vec![Effect::Exit(ExitReason::Cancelled)],
            _ => {}
        }
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollUp => app.move_cursor(-SCROLL_STEP),
            MouseEventKind::ScrollDown => app.move_cursor(SCROLL_STEP),
            MouseEventKind::Down(MouseButton::Left) if self.list_area.contains(position) => {
                let index = self.offset + usize::from(mouse.row - self.list_area.y);
                if index < app.rows.len() {
                    if index == app.cursor {
                        app.activate_current();
                    } else {
                        app.cursor = index;
                    }
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(rect);

        render_search(frame, layout[0], app);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);
        self.render_tree_list(frame, body[0], app);
        render_details(frame, body[1], app);

        render_status(frame, layout[2], app);
        render_footer(frame, layout[3], &*app.theme);
    }
}

impl TreePickerComponent {
    fn render_tree_list(&mut self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = &*app.theme;
        let block = th::block(theme, Some("Step Output"), !app.search.editing);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.list_area = inner;

        let height = usize::from(inner.height);
        self.offset = self.offset.min(app.rows.len().saturating_sub(1));
        self.scroll_to_cursor(app.cursor, height);

        let width = usize::from(inner.width);
        let lines: Vec<Line> = app
            .rows
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(height)
            .map(|(index, row)| {
                let line = Line::from(row_spans(row, theme, &app.search.term, width));
                if index == app.cursor {
                    line.style(theme.selection_style().add_modifier(Modifier::BOLD))
                } else {
                    line
                }
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn row_spans(row: &TreeRow, theme: &dyn Theme, search: &str, width: usize) -> Vec<Span<'static>> {
    let highlight = theme.search_highlight_style();
    let mut spans = Vec::new();
    let indent = "  ".repeat(row.depth);
    let mut used = indent.width();
    if !indent.is_empty() {
        spans.push(Span::raw(indent));
    }

    if !row.marker.is_empty() {
        spans.push(Span::styled(row.marker, marker_style(row, theme)));
        spans.push(Span::raw(" "));
        used += row.marker.width() + 1;
    }

    let label_style = match row.style {
        RowStyle::Value(_) => row
            .color
            .as_deref()
            .and_then(parse_color)
            .map(|color| Style::default().fg(color).add_modifier(Modifier::BOLD))
            .unwrap_or_else(|| theme.text_primary_style()),
        RowStyle::Affordance => theme.accent_secondary_style().add_modifier(Modifier::ITALIC),
        RowStyle::Error => theme.status_error(),
        RowStyle::Notice => theme.text_muted_style().add_modifier(Modifier::ITALIC),
    };
    let label = truncate_to_width(&row.label, width.saturating_sub(used));
    used += label.width();
    if matches!(row.style, RowStyle::Value(_)) {
        spans.extend(highlight_segments(search, &label, label_style, highlight));
    } else {
        spans.push(Span::styled(label, label_style));
    }

    if let (Some(preview), RowStyle::Value(kind)) = (&row.preview, row.style) {
        let remaining = width.saturating_sub(used + 2);
        if remaining > 0 {
            spans.push(Span::styled(": ", theme.text_muted_style()));
            let preview = truncate_to_width(preview, remaining);
            spans.extend(highlight_segments(search, &preview, theme.value_style(kind), highlight));
        }
    }
    spans
}

fn marker_style(row: &TreeRow, theme: &dyn Theme) -> Style {
    match (row.marker, row.style) {
        (MARKER_SELECTED, _) => theme.accent_primary_style().add_modifier(Modifier::BOLD),
        (MARKER_UNSELECTED, _) => theme.text_muted_style(),
        (MARKER_ERROR, _) | (_, RowStyle::Error) => theme.status_error(),
        (_, RowStyle::Affordance) => theme.accent_secondary_style(),
        _ => theme.syntax_keyword_style(),
    }
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &*app.theme;
    let block = th::block(theme, Some("Search"), app.search.editing);
    let mut spans = if app.search.term.is_empty() && !app.search.editing {
        vec![Span::styled("[press / to search keys and values]", theme.text_muted_style())]
    } else {
        vec![Span::styled(app.search.term.clone(), theme.text_primary_style())]
    };
    if app.search.editing {
        spans.push(Span::styled("▏", theme.accent_primary_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_details(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &*app.theme;
    let block = th::block(theme, Some("Details"), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    let row = app.current_row();
    match (row, row.and_then(|row| row.path.as_ref())) {
        (Some(row), Some(path)) if row.style != RowStyle::Error => {
            lines.push(Line::from(vec![
                Span::styled("Path: ", theme.text_secondary_style()),
                Span::styled(path.to_string(), theme.syntax_type_style()),
            ]));
            if let Some(kind) = app.current_kind() {
                lines.push(Line::from(vec![
                    Span::styled("Type: ", theme.text_secondary_style()),
                    Span::styled(kind.to_string(), theme.syntax_keyword_style()),
                ]));
            }
            if !row.selected && app.selection.has_selected_descendant(&path.to_string()) {
                lines.push(Line::from(Span::styled("Contains selected paths", theme.accent_primary_style())));
            }
            lines.push(Line::default());
            if let Some(value) = app.current_value() {
                let budget = usize::from(inner.height).saturating_sub(lines.len() + 2);
                lines.extend(highlighted_json_lines(value, theme, budget.max(1)));
            }
        }
        (Some(row), _) => {
            let hint = match row.style {
                RowStyle::Affordance => "Press Enter to load.",
                RowStyle::Error => "This subtree could not be rendered.",
                _ => "",
            };
            lines.push(Line::from(Span::styled(row.label.clone(), theme.text_secondary_style())));
            lines.push(Line::from(Span::styled(hint, theme.text_muted_style())));
        }
        (None, _) => lines.push(Line::from(Span::styled("Nothing to show.", theme.text_muted_style()))),
    }

    let count = app.selection.len();
    let noun = if count == 1 { "path" } else { "paths" };
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("{count} selected {noun}"),
        theme.text_muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &*app.theme;
    let Some(status) = &app.status else {
        return;
    };
    let style = match status.level {
        StatusLevel::Info => theme.status_success(),
        StatusLevel::Warning => theme.status_warning(),
        StatusLevel::Error => theme.status_error(),
    };
    frame.render_widget(Paragraph::new(Span::styled(status.message.clone(), style)), area);
}

fn render_footer(frame: &mut Frame, area: Rect, theme: &dyn Theme) {
    let hints = [
        ("↑/↓", "move"),
        ("←/→", "collapse/expand"),
        ("Enter", "toggle/select"),
        ("/", "search"),
        ("t", "theme"),
        ("q", "done"),
        ("Esc", "cancel"),
    ];
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(format!("[{key}] "), theme.accent_secondary_style()));
        spans.push(Span::styled(format!("{action}  "), theme.text_secondary_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrowseSession;
    use crate::ui::theme::{LoadedTheme, catalog};
    use indexmap::IndexMap;
    use ratatui::{Terminal, backend::TestBackend};
    use ryvr_engine::{BrowserOptions, SelectionSet};
    use ryvr_util::UserPreferences;
    use serde_json::json;
    use std::sync::Arc;

    fn test_app() -> App {
        app_with_color("cyan")
    }

    fn app_with_color(color: &str) -> App {
        let session = BrowseSession {
            data: json!([
                { "id": "fetch", "output": { "email": "ada@example.com", "count": 3 } },
                { "id": "send", "output": null }
            ]),
            selection: SelectionSet::new(),
            options: BrowserOptions::default(),
            search: String::new(),
            node_colors: IndexMap::from([("fetch".to_string(), color.to_string())]),
            preferences: Arc::new(UserPreferences::ephemeral()),
        };
        App::new(session, LoadedTheme::from_definition(catalog::default_truecolor()))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn renders_rows_details_and_hints() {
        let mut app = test_app();
        let mut component = TreePickerComponent::default();
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).expect("terminal");
        terminal
            .draw(|frame| component.render(frame, frame.area(), &mut app))
            .expect("draw");

        let text = buffer_text(&terminal);
        assert!(text.contains("▾ fetch"));
        assert!(text.contains("[ ] email"));
        assert!(text.contains("Path: fetch"));
        assert!(text.contains("[q] done"));
    }

    #[test]
    fn malformed_node_colors_fall_back_to_theme_text() {
        let mut app = app_with_color("#a€bc");
        let mut component = TreePickerComponent::default();
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).expect("terminal");
        terminal
            .draw(|frame| component.render(frame, frame.area(), &mut app))
            .expect("draw");
        assert!(buffer_text(&terminal).contains("▾ fetch"));
    }

    #[test]
    fn keys_drive_the_app() {
        let mut app = test_app();
        let mut component = TreePickerComponent::default();

        for _ in 0..3 {
            component.handle_key_events(&mut app, key(KeyCode::Down));
        }
        assert_eq!(app.current_row().map(|row| row.label.as_str()), Some("email"));
        component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert!(app.selection.contains("fetch.output.email"));

        assert_eq!(
            component.handle_key_events(&mut app, key(KeyCode::Char('q'))),
            vec![Effect::Exit(ExitReason::Confirmed)]
        );
        assert_eq!(
            component.handle_key_events(&mut app, key(KeyCode::Esc)),
            vec![Effect::Exit(ExitReason::Cancelled)]
        );
    }

    #[test]
    fn search_mode_captures_typing() {
        let mut app = test_app();
        let mut component = TreePickerComponent::default();
        component.handle_key_events(&mut app, key(KeyCode::Char('/')));
        for character in "count".chars() {
            component.handle_key_events(&mut app, key(KeyCode::Char(character)));
        }
        assert_eq!(app.search.term, "count");
        assert!(app.rows.iter().any(|row| row.label == "count"));
        assert!(!app.rows.iter().any(|row| row.label == "email"));

        // `q` is text while editing, not quit.
        assert!(component.handle_key_events(&mut app, key(KeyCode::Char('q'))).is_empty());
        component.handle_key_events(&mut app, key(KeyCode::Esc));
        assert!(app.search.term.is_empty());
        assert!(!app.search.editing);
    }

    #[test]
    fn scrolling_keeps_the_cursor_visible() {
        let mut component = TreePickerComponent::default();
        component.scroll_to_cursor(12, 5);
        assert_eq!(component.offset, 8);
        component.scroll_to_cursor(3, 5);
        assert_eq!(component.offset, 3);
    }
}
