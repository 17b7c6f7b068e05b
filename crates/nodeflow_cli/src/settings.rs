// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver settings.
//!
//! Stored as RON next to the scenes (`nodeflow.ron`). A missing file means
//! defaults; every field is optional in the file.

use nodeflow_graph::MaterialKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "nodeflow.ron";

/// Errors reading or writing settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("settings I/O: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid settings RON
    #[error("settings parse: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Settings could not be serialised
    #[error("settings serialize: {0}")]
    Serialize(#[from] ron::Error),
    /// Written by a newer version
    #[error("settings version {0} is newer than supported version {SETTINGS_FORMAT_VERSION}")]
    UnsupportedVersion(u32),
}

/// Settings for the command-line driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFlowSettings {
    /// Format version
    pub version: u32,
    /// Material kind used when `--into` is not given
    pub default_target: MaterialKind,
    /// Catalog override (RON), replacing the built-in rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Slot map override (RON), replacing the built-in map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_map_path: Option<PathBuf>,
    /// Execute even when validation reports errors
    pub proceed_on_error: bool,
    /// Execute when validation reports only warnings
    pub proceed_on_warning: bool,
    /// Log filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for NodeFlowSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            default_target: MaterialKind::AiStandardSurface,
            catalog_path: None,
            slot_map_path: None,
            proceed_on_error: false,
            proceed_on_warning: true,
            log_filter: "nodeflow=info".to_string(),
        }
    }
}

impl NodeFlowSettings {
    /// Parse settings from RON text
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: NodeFlowSettings = ron::from_str(text)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion(settings.version));
        }
        Ok(settings)
    }

    /// Serialise settings to RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No settings at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}
