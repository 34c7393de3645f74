//! Runtime: event loop and input routing for the picker.
//!
//! - Owns the terminal lifecycle (alternate screen, raw mode, mouse capture).
//! - A blocking input task reads crossterm events and forwards them over a
//!   channel, so the async loop never polls the terminal itself.
//! - Each event is handled to completion and the frame is redrawn.
//! - Effects that touch the disk run on the blocking pool and report back as
//!   [`Msg`]s.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use ratatui::{Terminal, prelude::*};
use ryvr_util::UserPreferences;
use tokio::{signal, sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::app::{App, Effect, ExitReason, Msg};
use crate::ui::components::TreePickerComponent;
use crate::ui::components::component::Component;

type Backend = CrosstermBackend<std::io::Stdout>;

/// Spawn a blocking task that reads terminal input and forwards it.
///
/// The task exits once the receiver is dropped.
fn spawn_input_task() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(256);
    let poll_interval = Duration::from_millis(50);
    tokio::task::spawn_blocking(move || {
        loop {
            if sender.is_closed() {
                break;
            }
            match event::poll(poll_interval) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(error) => {
                    warn!("Failed to poll terminal events: {}", error);
                    break;
                }
            }
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!("Failed to read event: {}", error);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("Failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, picker: &mut TreePickerComponent) -> Result<()> {
    terminal.draw(|frame| picker.render(frame, frame.area(), app))?;
    Ok(())
}

fn handle_input_event(app: &mut App, picker: &mut TreePickerComponent, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => picker.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => picker.handle_mouse_events(app, mouse_event),
        Event::Resize(width, height) => picker.handle_message(app, &Msg::Resize(width, height)),
        _ => Vec::new(),
    }
}

/// Runs effects. Disk writes are spawned; everything else is immediate.
fn process_effects(app: &mut App, effects: Vec<Effect>, pending: &mut FuturesUnordered<JoinHandle<Msg>>) {
    for effect in effects {
        match effect {
            Effect::SaveThemePreference(theme_id) => {
                let preferences = Arc::clone(&app.preferences);
                pending.push(tokio::task::spawn_blocking(move || save_theme(&preferences, theme_id)));
            }
            Effect::Exit(reason) => app.finish(reason),
        }
    }
}

fn save_theme(preferences: &UserPreferences, theme_id: String) -> Msg {
    let result = preferences
        .set_preferred_theme(Some(theme_id.clone()))
        .map(|()| theme_id)
        .map_err(|error| error.to_string());
    Msg::PreferencesSaved(result)
}

/// Sets up the terminal, runs the event loop until the user finishes or
/// cancels, and restores the terminal.
pub async fn run_app(mut app: App) -> Result<App> {
    let mut input_receiver = spawn_input_task();
    let mut picker = TreePickerComponent::default();
    let mut terminal = setup_terminal()?;
    let mut pending: FuturesUnordered<JoinHandle<Msg>> = FuturesUnordered::new();

    let outcome = event_loop(&mut terminal, &mut app, &mut picker, &mut input_receiver, &mut pending).await;

    // Let in-flight preference writes land before handing control back.
    while let Some(joined) = pending.next().await {
        if let Err(error) = joined {
            warn!("Preferences task failed: {}", error);
        }
    }
    cleanup_terminal(&mut terminal)?;
    outcome?;
    Ok(app)
}

async fn event_loop(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    picker: &mut TreePickerComponent,
    input_receiver: &mut mpsc::Receiver<Event>,
    pending: &mut FuturesUnordered<JoinHandle<Msg>>,
) -> Result<()> {
    render(terminal, app, picker)?;

    while app.exit.is_none() {
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    debug!("input channel closed");
                    app.finish(ExitReason::Cancelled);
                    break;
                };
                if let Event::Key(key_event) = event
                    && key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL)
                {
                    app.finish(ExitReason::Cancelled);
                    break;
                }
                let effects = handle_input_event(app, picker, event);
                process_effects(app, effects, pending);
            }

            Some(joined) = pending.next(), if !pending.is_empty() => {
                let msg = joined.unwrap_or_else(|error| Msg::PreferencesSaved(Err(error.to_string())));
                let effects = picker.handle_message(app, &msg);
                process_effects(app, effects, pending);
            }

            _ = signal::ctrl_c() => {
                app.finish(ExitReason::Cancelled);
                break;
            }
        }

        render(terminal, app, picker)?;
    }
    Ok(())
}
