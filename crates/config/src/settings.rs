// Search and sort settings
// Loaded from ~/.config/datagrid/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use datagrid_engine::{FieldScope, SortCriterion, DEFAULT_NGRAM_SIZE};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that switches fuzzy search on or off.
pub const SEARCH_ENV: &str = "DATAGRID_SEARCH";

/// A grid column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeader {
    /// Record field shown in this column
    pub key: String,
    /// Header text
    pub caption: String,
    /// CSS length, e.g. "120px" (None = auto)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ColumnHeader {
    pub fn new(key: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            caption: caption.into(),
            width: None,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Search
    #[serde(rename = "search.enabled")]
    pub search_enabled: bool,

    #[serde(rename = "search.ngramSize")]
    pub ngram_size: usize,

    #[serde(rename = "search.threshold")]
    pub threshold: f64,

    /// Fields consulted by search (empty = all indexed fields)
    #[serde(rename = "search.fields")]
    pub search_fields: Vec<String>,

    // Sort
    #[serde(rename = "sort.default")]
    pub default_sort: Vec<SortCriterion>,

    // Columns
    pub columns: Vec<ColumnHeader>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_enabled: true,
            ngram_size: DEFAULT_NGRAM_SIZE,
            threshold: 0.3,
            search_fields: Vec::new(),
            default_sort: Vec::new(),
            columns: Vec::new(),
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Fuzzy search
    "search.enabled": true,
    "search.ngramSize": 3,
    "search.threshold": 0.3,

    // Fields to search (empty = every text or number field)
    "search.fields": [],

    // Default ordering, e.g. [{ "key": "name", "direction": "asc" }]
    "sort.default": [],

    // Column headers, e.g. [{ "key": "name", "caption": "Name", "width": "120px" }]
    "columns": []
}
"#;

/// Parse a yes/no style flag: "true", "yes", "1" and "on" (any case) are true.
pub fn parse_flag(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1" | "on")
}

/// Drop `//` comment lines so the file can be annotated.
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datagrid")
            .join("settings.json")
    }

    /// Load settings from the default path, falling back to defaults.
    /// Creates a commented default file when none exists.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::write_default_file(&path) {
                warn!("cannot write default settings to {}: {}", path.display(), e);
            }
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load from `path`; any error logs a warning and yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}: {}; using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Strict load: read, parse, validate.
    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Parse settings JSON (comment lines allowed) and validate.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(&strip_comments(contents))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ngram_size == 0 {
            return Err(ConfigError::Invalid("search.ngramSize must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Invalid(format!(
                "search.threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if let Some(c) = self.default_sort.iter().find(|c| c.key.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("sort.default has an empty key ({c})")));
        }
        if let Some(c) = self.columns.iter().find(|c| c.key.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "column '{}' has an empty key",
                c.caption
            )));
        }
        Ok(())
    }

    /// Apply overrides from the environment (`DATAGRID_SEARCH`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(SEARCH_ENV) {
            self.search_enabled = parse_flag(&value);
        }
    }

    /// Save current settings to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Fields a search consults.
    pub fn search_scope(&self) -> FieldScope {
        FieldScope::from_keys(self.search_fields.clone())
    }

    /// Columns to show, in configured order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnHeader> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn column(&self, key: &str) -> Option<&ColumnHeader> {
        self.columns.iter().find(|c| c.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagrid_engine::SortDirection;

    #[test]
    fn test_default_file_parses_to_defaults() {
        let settings = Settings::from_json(DEFAULT_FILE).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let json = r#"{
            // only the threshold
            "search.threshold": 0.5,
            "sort.default": [{ "key": "dept" }, { "key": "age", "direction": "desc" }]
        }"#;
        let settings = Settings::from_json(json).unwrap();

        assert_eq!(settings.threshold, 0.5);
        assert_eq!(settings.ngram_size, 3);
        assert!(settings.search_enabled);
        assert_eq!(settings.default_sort.len(), 2);
        assert_eq!(settings.default_sort[0].direction, SortDirection::Ascending);
        assert_eq!(settings.default_sort[1], SortCriterion::desc("age"));
    }

    #[test]
    fn test_columns() {
        let json = r#"{
            "columns": [
                { "key": "name", "caption": "Name", "width": "120px" },
                { "key": "secret", "caption": "Secret", "visible": false },
                { "key": "age", "caption": "Age" }
            ]
        }"#;
        let settings = Settings::from_json(json).unwrap();

        let visible: Vec<&str> = settings.visible_columns().map(|c| c.key.as_str()).collect();
        assert_eq!(visible, vec!["name", "age"]);
        assert_eq!(settings.column("name").and_then(|c| c.width.as_deref()), Some("120px"));
        assert!(settings.column("missing").is_none());
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            Settings::from_json(r#"{ "search.ngramSize": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "search.threshold": 1.5 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "sort.default": [{ "key": "" }] }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "sort.default": [{ "key": "a", "direction": "up" }] }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(Settings::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_search_scope() {
        let mut settings = Settings::default();
        assert_eq!(settings.search_scope(), FieldScope::All);
        settings.search_fields = vec!["name".into()];
        assert_eq!(settings.search_scope(), FieldScope::Only(vec!["name".into()]));
    }

    #[test]
    fn test_parse_flag() {
        for yes in ["true", "YES", "1", "On", " on "] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["false", "no", "0", "off", "", "y"] {
            assert!(!parse_flag(no), "{no}");
        }
    }
}
