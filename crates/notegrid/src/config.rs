//! Settings persistence for the add-on controller.

use shared::settings::Settings;
use std::path::PathBuf;

/// Location of the settings file inside the platform config directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("notegrid");
        p.push("settings.json");
        p
    })
}

/// Load settings from disk or return defaults.
pub fn load_settings_or_default() -> Settings {
    if let Some(path) = config_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            if let Ok(settings) = serde_json::from_str::<Settings>(&contents) {
                return settings;
            }
        }
    }
    Settings::default()
}

/// Save settings to disk, best effort.
pub fn save_settings(settings: &Settings) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(settings) {
            let _ = std::fs::write(&path, json);
        }
    }
}
