// Configuration for value formatting and the debug printer

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File searched for by [`Settings::from_dir`]
pub const SETTINGS_FILE: &str = "litprint.json";

/// Size thresholds and layout limits for the built-in formatters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Maps above this size become `<dict with N items>`
    #[serde(default = "default_max_items")]
    pub max_map_items: usize,

    /// Lists above this size become `<list with N items>`
    #[serde(default = "default_max_items")]
    pub max_list_items: usize,

    /// Tuples above this size become `<tuple with N items>`
    #[serde(default = "default_max_items")]
    pub max_tuple_items: usize,

    /// Sets above this size become `<set with N items>`
    #[serde(default = "default_max_set_items")]
    pub max_set_items: usize,

    /// Longest byte string shown verbatim
    #[serde(default = "default_max_items")]
    pub max_bytes_len: usize,

    /// Maps of scalars up to this size stay on one line
    #[serde(default = "default_inline_map_items")]
    pub inline_map_items: usize,

    /// Lists and tuples of scalars up to this size stay on one line
    #[serde(default = "default_inline_seq_items")]
    pub inline_seq_items: usize,

    /// Sets up to this size stay on one line
    #[serde(default = "default_inline_seq_items")]
    pub inline_set_items: usize,

    /// `Debug` output longer than this switches to `{:#?}`
    #[serde(default = "default_pretty_width")]
    pub pretty_width: usize,

    /// Deeper nesting is reported as a formatting error
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_items() -> usize {
    50
}
fn default_max_set_items() -> usize {
    20
}
fn default_inline_map_items() -> usize {
    3
}
fn default_inline_seq_items() -> usize {
    5
}
fn default_pretty_width() -> usize {
    80
}
fn default_max_depth() -> usize {
    32
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_map_items: default_max_items(),
            max_list_items: default_max_items(),
            max_tuple_items: default_max_items(),
            max_set_items: default_max_set_items(),
            max_bytes_len: default_max_items(),
            inline_map_items: default_inline_map_items(),
            inline_seq_items: default_inline_seq_items(),
            inline_set_items: default_inline_seq_items(),
            pretty_width: default_pretty_width(),
            max_depth: default_max_depth(),
        }
    }
}

/// Debug printer settings, usually read from `litprint.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Text written before every line
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Show `[file:line in function()]`. Unset, `lit!` shows it and
    /// `litprint!` does not; when set it applies to `litprint!`.
    #[serde(default)]
    pub include_context: Option<bool>,

    /// Show absolute file paths in the context
    #[serde(default)]
    pub use_absolute_paths: bool,

    /// Longest single line before switching to multi-line layout
    #[serde(default = "default_line_wrap_width")]
    pub line_wrap_width: usize,

    /// Highlighting theme name
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Syntax-highlight output on stderr
    #[serde(default = "default_true")]
    pub colorize: bool,

    /// Start enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub format: FormatConfig,
}

fn default_prefix() -> String {
    "LIT| ".to_string()
}
fn default_true() -> bool {
    true
}
fn default_line_wrap_width() -> usize {
    70
}
fn default_theme() -> String {
    "cyberpunk".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            include_context: None,
            use_absolute_paths: false,
            line_wrap_width: default_line_wrap_width(),
            theme: default_theme(),
            colorize: true,
            enabled: true,
            format: FormatConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a litprint.json file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from directory (searches for litprint.json upwards)
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut current = Some(dir.as_ref());
        while let Some(dir) = current {
            let path = dir.join(SETTINGS_FILE);
            if path.exists() {
                log::debug!("loading settings from {}", path.display());
                return Self::from_file(path);
            }
            current = dir.parent();
        }

        // No settings found, use defaults
        Ok(Self::default())
    }

    /// Save settings to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Example settings file
    pub fn example() -> String {
        serde_json::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.prefix, "LIT| ");
        assert_eq!(settings.line_wrap_width, 70);
        assert_eq!(settings.include_context, None);
        assert_eq!(settings.format.max_set_items, 20);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"prefix": "dbg> "}"#).unwrap();
        assert_eq!(settings.prefix, "dbg> ");
        assert_eq!(settings.theme, "cyberpunk");
        assert_eq!(settings.format, FormatConfig::default());

        let settings: Settings = serde_json::from_str(r#"{"include_context": true}"#).unwrap();
        assert_eq!(settings.include_context, Some(true));
    }

    #[test]
    fn test_example_settings() {
        let example = Settings::example();
        assert!(example.contains("line_wrap_width"));
        assert!(example.contains("max_map_items"));
    }

    #[test]
    fn test_from_dir_searches_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut settings = Settings::default();
        settings.line_wrap_width = 120;
        settings.save(root.path().join(SETTINGS_FILE)).unwrap();

        let loaded = Settings::from_dir(&nested).unwrap();
        assert_eq!(loaded.line_wrap_width, 120);
    }

    #[test]
    fn test_from_file_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
