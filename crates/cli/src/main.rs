use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use ryvr_engine::{BrowserOptions, SelectionSet, TreeBrowser, TreeInput, flatten, leaf_paths, render_text, validate_selection};
use ryvr_tui::{BrowseOutcome, BrowseSession, ExitReason};
use ryvr_types::{Limits, TreePath};
use ryvr_util::{PreferencesPayload, UserPreferences, config_dir_for_app, load_document};
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Log file used while the terminal picker owns the screen.
const TUI_LOG_FILE: &str = "ryvr.log";

#[derive(Parser, Debug)]
#[command(name = "ryvr", version, about = "Browse workflow step output and pick variable paths.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive picker and print the chosen paths on exit.
    Browse(BrowseArgs),
    /// Print the tree with default expansion.
    Render(RenderArgs),
    /// Print every selectable leaf path.
    Paths(DocumentArgs),
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// JSON or YAML document, or `-` for stdin.
    source: String,
    /// Field used to label records when the document is an array.
    #[arg(long)]
    id_field: Option<String>,
}

#[derive(Args, Debug, Default)]
struct LimitArgs {
    #[arg(long)]
    max_depth: Option<usize>,
    #[arg(long)]
    max_items: Option<usize>,
    #[arg(long)]
    max_props: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    document: DocumentArgs,
    #[command(flatten)]
    limits: LimitArgs,
    /// Case-insensitive filter on keys and values.
    #[arg(long)]
    search: Option<String>,
    /// Pre-selected leaf path; repeatable.
    #[arg(long = "select", value_name = "PATH")]
    selected: Vec<String>,
}

#[derive(Args, Debug)]
struct BrowseArgs {
    #[command(flatten)]
    render: RenderArgs,
    /// Display color for a top-level key, as KEY=COLOR; repeatable.
    #[arg(long = "color", value_name = "KEY=COLOR", value_parser = parse_key_value)]
    colors: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Browse(_)));
    let preferences = Arc::new(load_preferences());
    let payload = preferences.snapshot();

    match cli.command {
        Command::Paths(args) => {
            let data = load_document(&args.source)?;
            let id_field = args.id_field.unwrap_or(payload.record_id_field);
            for path in leaf_paths(&data, &id_field) {
                println!("{path}");
            }
        }
        Command::Render(args) => {
            let data = load_document(&args.document.source)?;
            let options = browser_options(&payload, &args);
            let selection = parse_selection(&data, &args.selected, &options.record_id_field)?;
            let search = args.search.unwrap_or_default();
            let mut browser = TreeBrowser::new(options);
            let view = browser.render(&TreeInput::new(&data, &selection).with_search(&search));
            print!("{}", render_text(&flatten(&view)));
        }
        Command::Browse(args) => {
            let data = load_document(&args.render.document.source)?;
            let options = browser_options(&payload, &args.render);
            let selection = parse_selection(&data, &args.render.selected, &options.record_id_field)?;
            let mut node_colors = payload.node_colors.clone();
            node_colors.extend(args.colors);
            let session = BrowseSession {
                data,
                selection,
                options,
                search: args.render.search.unwrap_or_default(),
                node_colors,
                preferences,
            };
            let BrowseOutcome { reason, selection } = ryvr_tui::run(session).await?;
            if reason == ExitReason::Confirmed {
                for path in selection.iter() {
                    println!("{path}");
                }
            }
        }
    }
    Ok(())
}

/// Logs go to stderr, or to a file under the config dir while the picker
/// owns the terminal.
fn init_tracing(tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if !tui {
        let _ = builder.with_writer(std::io::stderr).try_init();
        return;
    }

    let log_dir = config_dir_for_app();
    let file = fs::create_dir_all(&log_dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(log_dir.join(TUI_LOG_FILE)));
    match file {
        Ok(file) => {
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        Err(_) => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }
}

fn load_preferences() -> UserPreferences {
    match UserPreferences::new() {
        Ok(preferences) => {
            debug!(path = %preferences.path().display(), "loaded preferences");
            preferences
        }
        Err(error) => {
            warn!(error = %error, "Failed to load preferences; using in-memory defaults");
            UserPreferences::ephemeral()
        }
    }
}

fn browser_options(payload: &PreferencesPayload, args: &RenderArgs) -> BrowserOptions {
    let limits = Limits {
        max_depth: args.limits.max_depth.unwrap_or(payload.limits.max_depth),
        max_array_items: args.limits.max_items.unwrap_or(payload.limits.max_array_items),
        max_object_props: args.limits.max_props.unwrap_or(payload.limits.max_object_props),
        ..payload.limits
    };
    BrowserOptions {
        limits,
        record_id_field: args
            .document
            .id_field
            .clone()
            .unwrap_or_else(|| payload.record_id_field.clone()),
        ..BrowserOptions::default()
    }
}

/// Parses and validates `--select` paths; each must name an existing leaf.
fn parse_selection(data: &Value, selected: &[String], id_field: &str) -> Result<SelectionSet> {
    let mut selection = SelectionSet::new();
    for raw in selected {
        let path: TreePath = raw.parse().with_context(|| format!("Invalid --select path '{raw}'"))?;
        validate_selection(data, &path, id_field).with_context(|| format!("Cannot select '{raw}'"))?;
        selection.insert(path.to_string());
    }
    Ok(selection)
}

fn parse_key_value(input: &str) -> Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=COLOR, got '{input}'"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(anyhow!("expected KEY=COLOR, got '{input}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render_args(argv: &[&str]) -> RenderArgs {
        let cli = Cli::try_parse_from(argv).expect("parse");
        match cli.command {
            Command::Render(args) => args,
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn key_value_pairs_parse() {
        assert_eq!(
            parse_key_value("fetch = cyan").expect("pair"),
            ("fetch".to_string(), "cyan".to_string())
        );
        assert!(parse_key_value("fetch").is_err());
        assert!(parse_key_value("=cyan").is_err());
    }

    #[test]
    fn selection_rejects_containers_and_missing_paths() {
        let data = json!([{ "id": "fetch", "output": { "total": 2 } }]);
        let selection = parse_selection(&data, &["fetch.output.total".to_string()], "id").expect("leaf");
        assert!(selection.contains("fetch.output.total"));

        let error = parse_selection(&data, &["fetch.output".to_string()], "id").expect_err("container");
        assert!(error.to_string().contains("Cannot select 'fetch.output'"));
        assert!(parse_selection(&data, &["fetch.nope".to_string()], "id").is_err());
        assert!(parse_selection(&data, &["fetch..x".to_string()], "id").is_err());
    }

    #[test]
    fn cli_flags_override_preferences() {
        let args = render_args(&["ryvr", "render", "run.json", "--max-depth", "2", "--id-field", "stepId"]);
        let mut payload = PreferencesPayload::default();
        payload.limits.max_array_items = 7;

        let options = browser_options(&payload, &args);
        assert_eq!(options.limits.max_depth, 2);
        assert_eq!(options.limits.max_array_items, 7);
        assert_eq!(options.record_id_field, "stepId");
    }

    #[test]
    fn browse_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "ryvr", "browse", "-", "--select", "a.b", "--select", "a.c", "--color", "a=red",
        ])
        .expect("parse");
        let Command::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        assert_eq!(args.render.document.source, "-");
        assert_eq!(args.render.selected, vec!["a.b", "a.c"]);
        assert_eq!(args.colors, vec![("a".to_string(), "red".to_string())]);
    }
}
