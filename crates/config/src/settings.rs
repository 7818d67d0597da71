// Grid settings
// Loaded from ~/.config/pagegrid/settings.json

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::messages::{Locale, Messages};
use crate::{Color, ConfigError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Paging
    #[serde(rename = "grid.pageSize")]
    pub page_size: usize,

    #[serde(rename = "grid.maxRecords")]
    pub max_records: usize,

    #[serde(rename = "grid.groupBy")]
    pub group_by: Vec<String>,

    // UI
    #[serde(rename = "ui.locale")]
    pub locale: Locale,

    // Notifications
    #[serde(rename = "notify.errorDurationMs")]
    pub error_duration_ms: u64,

    #[serde(rename = "notify.successDurationMs")]
    pub success_duration_ms: u64,

    // Error reporting
    #[serde(rename = "errors.previewLimit")]
    pub error_preview_limit: usize,

    #[serde(rename = "errors.highlightColor")]
    pub error_highlight_color: String,

    // Header styling, role -> #rrggbb
    #[serde(rename = "header.roleColors")]
    pub role_colors: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut role_colors = BTreeMap::new();
        role_colors.insert("allocation".to_string(), "#e0f7fa".to_string());
        role_colors.insert("performance".to_string(), "#fce4ec".to_string());
        role_colors.insert("meta".to_string(), "#f3e5f5".to_string());

        Self {
            page_size: 40,
            max_records: 10_000,
            group_by: vec!["category".to_string()],
            locale: Locale::Ja,
            error_duration_ms: 8000,
            success_duration_ms: 3000,
            error_preview_limit: 3,
            error_highlight_color: "#ffe4e1".to_string(),
            role_colors,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagegrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}: {}; using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. Errors are reported, not swallowed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&contents)
    }

    /// Parse settings JSON. Lines starting with `//` are treated as comments.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Self =
            serde_json::from_str(&cleaned).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Parse("grid.pageSize must be positive".into()));
        }
        for (role, hex) in &self.role_colors {
            if Color::from_hex_str(hex).is_none() {
                return Err(ConfigError::Parse(format!(
                    "header.roleColors.{role}: invalid color '{hex}'"
                )));
            }
        }
        if Color::from_hex_str(&self.error_highlight_color).is_none() {
            return Err(ConfigError::Parse(format!(
                "errors.highlightColor: invalid color '{}'",
                self.error_highlight_color
            )));
        }
        Ok(self)
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn messages(&self) -> Messages {
        Messages::for_locale(self.locale)
    }

    /// Parsed role palette. Entries were checked on load.
    pub fn role_palette(&self) -> BTreeMap<String, Color> {
        self.role_colors
            .iter()
            .filter_map(|(role, hex)| Color::from_hex_str(hex).map(|c| (role.clone(), c)))
            .collect()
    }

    pub fn highlight_color(&self) -> Color {
        Color::from_hex_str(&self.error_highlight_color).unwrap_or(Color::from_hex(0xffe4e1))
    }
}
