//! Optional JSON settings file.
//!
//! ```json
//! {
//!   "palette": "braille",
//!   "touch": false,
//!   "overrides": { "trail_max_length": 60, "accent_hue": 300 },
//!   "macros": { "GHOST": 0.9 }
//! }
//! ```
//!
//! Every field may be omitted. The file is only ever read.

use crate::macros::{Macro, MacroState};
use crate::palette::DEFAULT_PALETTE;
use crate::params::ParamOverrides;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub palette: String,
    pub overrides: ParamOverrides,
    /// Macro name to value. A non-empty map switches the macro layer on.
    pub macros: BTreeMap<String, f32>,
    pub touch: bool,
    pub seed: Option<u64>,
    pub physics_hz: u32,
    pub render_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.to_string(),
            overrides: ParamOverrides::new(),
            macros: BTreeMap::new(),
            touch: false,
            seed: None,
            physics_hz: 60,
            render_ms: 100,
        }
    }
}

impl Settings {
    /// Macro state described by `macros`, or `None` when the map is empty.
    /// Unknown names are skipped.
    pub fn macro_state(&self) -> Option<MacroState> {
        if self.macros.is_empty() {
            return None;
        }
        let mut state = MacroState::default();
        for (name, value) in &self.macros {
            match Macro::from_name(name) {
                Some(m) => state.set(m, *value),
                None => log::warn!("ignoring unknown macro {name:?}"),
            }
        }
        Some(state)
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "glyphfield", "Glyphfield")
        .map(|p| p.config_dir().join("settings.json"))
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Loads `explicit` if given, failing loudly. Otherwise tries the default
/// location and falls back to defaults when there is no file there.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    if let Some(path) = explicit {
        return load_settings(path);
    }
    match default_settings_path() {
        Some(path) if path.exists() => load_settings(&path),
        _ => Ok(Settings::default()),
    }
}
