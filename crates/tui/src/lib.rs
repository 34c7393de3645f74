//! # RYVR Variable Picker
//!
//! Terminal front end for the JSON tree browser. It hosts the engine's
//! [`TreeBrowser`](ryvr_engine::TreeBrowser) in a ratatui application where
//! users walk a workflow step's output and pick the variable paths they want
//! to reference downstream.
//!
//! The caller owns the selection: it passes the initial set in through
//! [`BrowseSession`] and receives the final set back in [`BrowseOutcome`].

mod app;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use ryvr_engine::{BrowserOptions, SelectionSet};
use ryvr_util::UserPreferences;
use serde_json::Value;
use tracing::info;

pub use app::ExitReason;

/// Everything the picker needs to start.
pub struct BrowseSession {
    pub data: Value,
    pub selection: SelectionSet,
    pub options: BrowserOptions,
    /// Initial search term.
    pub search: String,
    /// Display colors for top-level keys.
    pub node_colors: IndexMap<String, String>,
    pub preferences: Arc<UserPreferences>,
}

/// How the picker was closed and what was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseOutcome {
    pub reason: ExitReason,
    pub selection: SelectionSet,
}

/// Runs the picker until the user finishes or cancels.
///
/// # Errors
///
/// Returns an error when the terminal cannot be put into (or restored from)
/// raw mode or a frame fails to draw.
pub async fn run(session: BrowseSession) -> Result<BrowseOutcome> {
    let loaded_theme = ui::theme::load(session.preferences.preferred_theme().as_deref());
    let app = app::App::new(session, loaded_theme);
    let app = ui::runtime::run_app(app).await?;
    let reason = app.exit.unwrap_or(ExitReason::Cancelled);
    let selection = app.into_selection();
    info!(?reason, selected = selection.len(), "picker closed");
    Ok(BrowseOutcome { reason, selection })
}
