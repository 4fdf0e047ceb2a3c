//! Configuration for refport
//!
//! Import and export defaults, loadable from TOML or JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with `\emph`, `\textit`, `\textbf` and friends when decoding
/// BibTeX values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisMode {
    /// Drop the markup, keep the text
    #[default]
    Strip,
    /// Rewrite as Markdown emphasis (`*text*`, `**text**`)
    Markdown,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefportConfig {
    pub import: ImportConfig,
    pub export: ExportConfig,
}

/// Import behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Records handled per batch; bounds memory only
    pub batch_size: usize,
    /// Merge duplicates into the stored record instead of skipping them
    pub update_existing: bool,
    /// LaTeX emphasis handling for BibTeX input
    pub emphasis: EmphasisMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            update_existing: false,
            emphasis: EmphasisMode::Strip,
        }
    }
}

/// Export behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub include_abstracts: bool,
    pub include_keywords: bool,
    pub include_urls: bool,
    /// Emit unmapped passthrough fields (RIS tags, BibTeX fields, CSL custom)
    pub include_extra_fields: bool,
    /// Word-wrap RIS abstracts
    pub wrap_abstracts: bool,
    /// Maximum RIS line length, tag prefix included
    pub max_line_length: usize,
    /// Maximum CSV abstract length, ellipsis included
    pub max_abstract_length: usize,
    /// Append a `Usage Count` column to CSV exports
    pub include_usage_count: bool,
    /// Export filename prefix: `<prefix>-<YYYYMMDD-HHMMSS>.<ext>`
    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_abstracts: true,
            include_keywords: true,
            include_urls: true,
            include_extra_fields: false,
            wrap_abstracts: true,
            max_line_length: 255,
            max_abstract_length: 500,
            include_usage_count: false,
            filename_prefix: "references".to_string(),
        }
    }
}

impl RefportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read a `.toml` or `.json` file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            Self::from_toml(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import.batch_size == 0 {
            return Err(ConfigError::OutOfRange(
                "import.batch_size must be positive".to_string(),
            ));
        }

        // Room for the "XX  - " prefix plus at least ten characters
        if self.export.max_line_length < 16 {
            return Err(ConfigError::OutOfRange(
                "export.max_line_length must be at least 16".to_string(),
            ));
        }

        if self.export.max_abstract_length < 4 {
            return Err(ConfigError::OutOfRange(
                "export.max_abstract_length must be at least 4".to_string(),
            ));
        }

        if self.export.filename_prefix.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "export.filename_prefix".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading or validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Invalid configuration: {0}")]
    Parse(String),
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RefportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.import.batch_size, 50);
        assert_eq!(config.export.max_line_length, 255);
        assert_eq!(config.export.max_abstract_length, 500);
        assert_eq!(config.import.emphasis, EmphasisMode::Strip);
    }

    #[test]
    fn test_toml_partial_override() {
        let toml = r#"
[import]
batch_size = 10
emphasis = "markdown"

[export]
include_abstracts = false
"#;
        let config = RefportConfig::from_toml(toml).unwrap();
        assert_eq!(config.import.batch_size, 10);
        assert_eq!(config.import.emphasis, EmphasisMode::Markdown);
        assert!(!config.import.update_existing);
        assert!(!config.export.include_abstracts);
        assert!(config.export.include_keywords);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RefportConfig::default();
        let toml = config.to_toml().unwrap();
        assert_eq!(RefportConfig::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_json_serialization() {
        let config = RefportConfig::default();
        let json = config.to_json().unwrap();
        let parsed = RefportConfig::from_json(&json).unwrap();
        assert_eq!(parsed.export.filename_prefix, "references");
    }

    #[test]
    fn test_invalid_values() {
        let mut config = RefportConfig::default();
        config.import.batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));

        let mut config = RefportConfig::default();
        config.export.max_line_length = 8;
        assert!(config.validate().is_err());

        let mut config = RefportConfig::default();
        config.export.filename_prefix = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refport.toml");
        std::fs::write(&path, "[import]\nupdate_existing = true\n").unwrap();

        let config = RefportConfig::load(&path).unwrap();
        assert!(config.import.update_existing);

        let missing = RefportConfig::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
