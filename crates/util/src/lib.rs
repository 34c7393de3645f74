pub mod document;
pub mod path_processing;
pub mod preferences;

pub use document::{load_document, parse_document};
pub use path_processing::{config_dir_for_app, expand_tilde, is_yaml_path};
pub use preferences::{PREFERENCES_PATH_ENV, PreferencesError, PreferencesPayload, UserPreferences};
