use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::command::DEFAULT_PROGRAM;
use crate::params::RegistrationParams;
use crate::render::DEFAULT_OVERLAY_ALPHA;
use crate::volume::IntensityMapping;

/// Everything the application remembers between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Program used for registration; a bare name is looked up on `PATH`.
    pub ants_registration: String,
    pub params: RegistrationParams,
    pub intensity_mapping: IntensityMapping,
    pub overlay_alpha: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ants_registration: DEFAULT_PROGRAM.to_string(),
            params: RegistrationParams::default(),
            intensity_mapping: IntensityMapping::default(),
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("antsreg")
        .join("settings.json")
}

pub fn save_settings(settings: &Settings) -> anyhow::Result<PathBuf> {
    let path = default_settings_path();
    save_settings_to(settings, &path)?;
    Ok(path)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Settings saved to: {}", path.display());
    Ok(())
}

pub fn load_settings() -> Settings {
    load_settings_from(&default_settings_path())
}

/// Read settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        log::info!("No settings file found. Using defaults.");
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<Settings>(&json) {
            Ok(mut settings) => {
                settings.params.fill_missing_fields();
                log::info!("Settings loaded from: {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse settings file: {}. Using defaults.", e);
                Settings::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read settings file: {}. Using defaults.", e);
            Settings::default()
        }
    }
}
