//! Error types for bibliography cleaning operations.
//!
//! This module defines a structured error hierarchy: parse failures carry
//! line/column positions, per-record failures carry the missing field, and
//! run-level failures (cancelled prompts, misuse of the duplicate pass) are
//! surfaced to the caller as [`CleanerError`].

use thiserror::Error;

/// A byte-offset span into the original source text.
///
/// Both `start` and `end` are byte offsets (not character indices) from the
/// beginning of the source string.  `start` is inclusive, `end` is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpan {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl SourceSpan {
    /// Create a new `SourceSpan`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Field name constants for consistent error reporting.
pub mod fields {
    pub const ENTRY_TYPE: &str = "ENTRYTYPE";
    pub const ID: &str = "ID";
    pub const TITLE: &str = "title";
    pub const JOURNAL: &str = "journal";
    pub const AUTHOR: &str = "author";
    pub const MONTH: &str = "month";
    pub const PAGES: &str = "pages";
    pub const VOLUME: &str = "volume";
    pub const THRESHOLD: &str = "accept_threshold";

    /// Keys every record must carry before it is normalized.
    pub const REQUIRED: [&str; 4] = [ENTRY_TYPE, ID, TITLE, JOURNAL];
}

/// Top-level error type for cleaning runs.
#[derive(Error, Debug)]
pub enum CleanerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Cannot look for duplicates before any records have been processed")]
    NothingToDeduplicate,
}

impl CleanerError {
    /// Whether the run stopped because the user interrupted a prompt.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CleanerError::Prompt(PromptError::Cancelled))
    }
}

/// Parse error with detailed location and context information.
#[derive(Error, Debug)]
#[error("Error in BibTeX input{}: {error}",
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {} column {}", l, c),
        (Some(l), None) => format!(" at line {}", l),
        (None, Some(c)) => format!(" at column {}", c),
        (None, None) => String::new(),
    }
)]
pub struct ParseError {
    /// Line number where the error occurred (1-based, None if not available)
    pub line: Option<usize>,
    /// Column number where the error occurred (1-based, None if not available)
    pub column: Option<usize>,
    /// Byte-offset span into the source text, for rich diagnostic rendering.
    pub span: Option<SourceSpan>,
    /// The specific error that occurred
    pub error: ValueError,
}

impl ParseError {
    /// Create a new ParseError.
    pub fn new(line: Option<usize>, column: Option<usize>, error: ValueError) -> Self {
        Self {
            line,
            column,
            span: None,
            error,
        }
    }

    /// Attach a byte-offset span to this error, returning `self` (builder style).
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Create a ParseError with just line information.
    pub fn at_line(line: usize, error: ValueError) -> Self {
        Self::new(Some(line), None, error)
    }

    /// Create a ParseError with line and column information.
    pub fn at_position(line: usize, column: usize, error: ValueError) -> Self {
        Self::new(Some(line), Some(column), error)
    }

    /// Create a ParseError without position information.
    pub fn without_position(error: ValueError) -> Self {
        Self::new(None, None, error)
    }
}

/// Specific value-level errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Bad syntax: {0}")]
    Syntax(String),

    #[error("Missing value for {key}")]
    MissingValue {
        field: &'static str,
        key: &'static str,
    },

    #[error("Bad value for {key}: \"{value}\" ({reason})")]
    BadValue {
        field: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure of the interactive prompt collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromptError {
    /// The user interrupted the prompt (Ctrl-C, Esc). Fatal to the run.
    #[error("Prompt cancelled by user")]
    Cancelled,

    #[error("Prompt failed: {0}")]
    Failed(String),
}

/// Errors raised while loading a [`crate::config::CleanerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Value(ValueError),
}

/// Errors raised by the abbreviation cache and its fetcher.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Abbreviation cache I/O failed on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Abbreviation cache {path} is unreadable: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode abbreviation cache: {0}")]
    Encode(#[from] toml::ser::Error),

    #[cfg(feature = "fetch")]
    #[error("Failed to fetch journal abbreviations: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error fetching journal abbreviations with code {0}")]
    Status(u16),

    #[error("No journal abbreviations available from {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::at_line(42, ValueError::Syntax("Unterminated entry".to_string()));

        let display = format!("{}", error);
        assert!(display.contains("line 42"));
        assert!(display.contains("BibTeX input"));
        assert!(display.contains("Unterminated entry"));
    }

    #[test]
    fn test_parse_error_with_position() {
        let error = ParseError::at_position(
            10,
            25,
            ValueError::MissingValue {
                field: fields::ID,
                key: "ID",
            },
        );

        let display = format!("{}", error);
        assert!(display.contains("line 10 column 25"));
    }

    #[test]
    fn test_parse_error_without_position() {
        let error = ParseError::without_position(ValueError::BadValue {
            field: fields::MONTH,
            key: "month",
            value: "Smarch".to_string(),
            reason: "not a month".to_string(),
        });

        let display = format!("{}", error);
        assert!(!display.contains("line"));
        assert!(!display.contains("column"));
    }

    #[test]
    fn test_value_error_display() {
        let error = ValueError::MissingValue {
            field: fields::JOURNAL,
            key: "journal",
        };
        assert_eq!(format!("{}", error), "Missing value for journal");

        let error = ValueError::BadValue {
            field: fields::THRESHOLD,
            key: "accept_threshold",
            value: "1.5".to_string(),
            reason: "must lie between 0 and 1".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Bad value for accept_threshold: \"1.5\" (must lie between 0 and 1)"
        );
    }

    #[test]
    fn test_cancellation_detection() {
        assert!(CleanerError::from(PromptError::Cancelled).is_cancelled());
        assert!(!CleanerError::from(PromptError::Failed("tty closed".into())).is_cancelled());
        assert!(!CleanerError::NothingToDeduplicate.is_cancelled());
    }
}
