use shared::settings::ChatSettings;
use std::path::{Path, PathBuf};
use tracing::warn;

/// `settings.json` in the platform config directory.
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "IlhamBot", "IlhamBot")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Load settings from disk or return defaults. The flag reports whether a
/// file was actually read.
pub fn load_settings_or_default() -> (ChatSettings, bool) {
    match config_path() {
        Some(path) => load_from(&path),
        None => (ChatSettings::default(), false),
    }
}

pub fn load_from(path: &Path) -> (ChatSettings, bool) {
    if !path.exists() {
        return (ChatSettings::default(), false);
    }
    match ChatSettings::from_json_file(path) {
        Ok(settings) => (settings, true),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable settings, using defaults");
            (ChatSettings::default(), false)
        }
    }
}
