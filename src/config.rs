//! Cleaner configuration.
//!
//! Settings are read from a TOML file. Every key is optional; missing keys
//! take the defaults listed on [`CleanerConfig`].
//!
//! ```toml
//! accept_threshold = 0.9
//! strip_fields = ["file", "bdsk-file-1", "abstract"]
//! database = "https://example.org/abbreviations.csv"
//! custom = ["Journal of Kittens;J. Kitt."]
//! cache_file = "/tmp/btcleaner-abbreviations.toml"
//! ```

use crate::error::{fields, ConfigError, ValueError};
use crate::resolve::DEFAULT_ACCEPT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Abbreviation list downloaded when no cache exists.
pub const DEFAULT_DATABASE: &str = "https://raw.githubusercontent.com/JabRef/abbrv.jabref.org/master/journals/journal_abbreviations_acs.csv";

/// Fields removed from every record by default.
pub const DEFAULT_STRIP_FIELDS: [&str; 2] = ["file", "bdsk-file-1"];

/// Configuration for a cleaning run.
///
/// # Defaults
///
/// - `accept_threshold`: `0.95`, matches scoring strictly above it are taken
///   without asking
/// - `strip_fields`: `file`, `bdsk-file-1`
/// - `database`: the JabRef ACS abbreviation list
/// - `custom`: none
/// - `cache_file`: the platform cache directory
///
/// # Examples
///
/// ```
/// use btcleaner::CleanerConfig;
///
/// let mut config = CleanerConfig::new();
/// config
///     .set_accept_threshold(0.9)
///     .add_custom("Journal of Kittens;J. Kitt.");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub(crate) accept_threshold: f64,
    pub(crate) strip_fields: Vec<String>,
    pub(crate) database: String,
    pub(crate) custom: Vec<String>,
    pub(crate) cache_file: Option<PathBuf>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanerConfig {
    /// Creates a configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
            strip_fields: DEFAULT_STRIP_FIELDS.iter().map(|s| s.to_string()).collect(),
            database: DEFAULT_DATABASE.to_string(),
            custom: Vec::new(),
            cache_file: None,
        }
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialize`] for malformed TOML and
    /// [`ConfigError::Value`] when a setting is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not hold a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// `<config dir>/btcleaner/config.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("btcleaner").join("config.toml"))
    }

    /// Load [`Self::default_path`] when that file exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be loaded.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::new()),
        }
    }

    /// Sets the score above which matches are accepted without asking
    pub fn set_accept_threshold(&mut self, threshold: f64) -> &mut Self {
        self.accept_threshold = threshold;
        self
    }

    /// Sets the fields removed from every record
    pub fn set_strip_fields(&mut self, names: Vec<String>) -> &mut Self {
        self.strip_fields = names;
        self
    }

    /// Sets the URL the abbreviation list is downloaded from
    pub fn set_database(&mut self, url: impl Into<String>) -> &mut Self {
        self.database = url.into();
        self
    }

    /// Adds a `full name;abbreviation` entry that overrides the database
    pub fn add_custom(&mut self, line: impl Into<String>) -> &mut Self {
        self.custom.push(line.into());
        self
    }

    /// Sets where the abbreviation cache lives
    pub fn set_cache_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Score above which a match is accepted without asking.
    pub fn accept_threshold(&self) -> f64 {
        self.accept_threshold
    }

    /// Fields removed from every record.
    pub fn strip_fields(&self) -> &[String] {
        &self.strip_fields
    }

    /// URL of the abbreviation list.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Custom `full name;abbreviation` lines.
    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    /// Cache file overriding the default location.
    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Value`] if the threshold lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(ConfigError::Value(ValueError::BadValue {
                field: fields::THRESHOLD,
                key: "accept_threshold",
                value: self.accept_threshold.to_string(),
                reason: "must lie between 0 and 1".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CleanerConfig::new();
        assert_eq!(config.accept_threshold(), 0.95);
        assert_eq!(config.strip_fields(), ["file", "bdsk-file-1"]);
        assert_eq!(config.database(), DEFAULT_DATABASE);
        assert!(config.custom().is_empty());
        assert!(config.cache_file().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CleanerConfig::from_toml_str(
            r#"
accept_threshold = 0.8
custom = ["Journal of Kittens;J. Kitt."]
"#,
        )
        .unwrap();
        assert_eq!(config.accept_threshold(), 0.8);
        assert_eq!(config.custom(), ["Journal of Kittens;J. Kitt."]);
        assert_eq!(config.strip_fields(), ["file", "bdsk-file-1"]);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(CleanerConfig::from_toml_str("").unwrap(), CleanerConfig::new());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_threshold_out_of_range(#[case] threshold: f64) {
        let mut config = CleanerConfig::new();
        config.set_accept_threshold(threshold);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Value(ValueError::BadValue { key: "accept_threshold", .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = CleanerConfig::from_toml_str("accept_threshold = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strip_fields = [\"abstract\"]\ncache_file = \"/tmp/abbrev.toml\"").unwrap();
        let config = CleanerConfig::load(file.path()).unwrap();
        assert_eq!(config.strip_fields(), ["abstract"]);
        assert_eq!(config.cache_file(), Some(Path::new("/tmp/abbrev.toml")));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CleanerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
