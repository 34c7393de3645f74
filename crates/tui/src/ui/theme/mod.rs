//! Theme styling for the picker.
//!
//! Defines the Dracula and Nord palettes, an ANSI 256-color fallback,
//! semantic theme roles, and helper builders for ratatui widgets. Prefer
//! these helpers over hard-coding colors.

use std::env;

use tracing::debug;

pub mod ansi256;
pub mod catalog;
pub mod dracula;
pub mod nord;
pub mod roles;
pub mod theme_helpers;

pub use ansi256::Ansi256Theme;
pub use catalog::ThemeDefinition;
pub use dracula::DraculaTheme;
pub use nord::NordTheme;
pub use roles::Theme;

/// Environment variable naming the theme to use.
pub const THEME_ENV: &str = "TUI_THEME";

/// Theme plus the definition it was built from.
pub struct LoadedTheme {
    pub definition: &'static ThemeDefinition,
    pub theme: Box<dyn Theme>,
}

impl LoadedTheme {
    pub fn from_definition(definition: &'static ThemeDefinition) -> Self {
        Self {
            definition,
            theme: definition.build(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCapability {
    Truecolor,
    Ansi256,
}

/// Selects a theme from `TUI_THEME`, then the persisted preference, then the
/// terminal's default.
pub fn load(preferred_theme: Option<&str>) -> LoadedTheme {
    load_for(detect_color_capability(), preferred_theme)
}

fn load_for(capability: ColorCapability, preferred_theme: Option<&str>) -> LoadedTheme {
    if capability == ColorCapability::Ansi256 {
        debug!("ANSI-only terminal detected; forcing fallback palette");
        return LoadedTheme::from_definition(catalog::default_ansi());
    }

    if let Ok(theme_name) = env::var(THEME_ENV)
        && let Some(definition) = catalog::resolve(theme_name.trim())
    {
        return LoadedTheme::from_definition(definition);
    }

    if let Some(name) = preferred_theme
        && let Some(definition) = catalog::resolve(name.trim())
    {
        return LoadedTheme::from_definition(definition);
    }

    LoadedTheme::from_definition(catalog::default_truecolor())
}

pub fn detect_color_capability() -> ColorCapability {
    if let Some(mode) = env::var("TUI_COLOR_MODE").ok().and_then(|value| parse_color_mode(value.trim())) {
        return mode;
    }

    let color_term = env::var("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if color_term.contains("truecolor") || color_term.contains("24bit") {
        return ColorCapability::Truecolor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term.contains("truecolor") || term.contains("direct") {
        return ColorCapability::Truecolor;
    }

    ColorCapability::Ansi256
}

fn parse_color_mode(value: &str) -> Option<ColorCapability> {
    match value.to_ascii_lowercase().as_str() {
        "truecolor" | "24bit" => Some(ColorCapability::Truecolor),
        "ansi256" | "256" | "8bit" => Some(ColorCapability::Ansi256),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_is_used_without_env_override() {
        temp_env::with_var_unset(THEME_ENV, || {
            let loaded = load_for(ColorCapability::Truecolor, Some("nord"));
            assert_eq!(loaded.definition.id, "nord");
        });
    }

    #[test]
    fn env_override_beats_preference() {
        temp_env::with_var(THEME_ENV, Some("dracula"), || {
            let loaded = load_for(ColorCapability::Truecolor, Some("nord"));
            assert_eq!(loaded.definition.id, "dracula");
        });
    }

    #[test]
    fn ansi_terminals_always_get_the_fallback() {
        let loaded = load_for(ColorCapability::Ansi256, Some("nord"));
        assert_eq!(loaded.definition.id, "ansi256");
    }

    #[test]
    fn color_mode_override_parses() {
        assert_eq!(parse_color_mode("24bit"), Some(ColorCapability::Truecolor));
        assert_eq!(parse_color_mode("256"), Some(ColorCapability::Ansi256));
        assert_eq!(parse_color_mode("mono"), None);
    }
}
