//! Normalization, journal abbreviation, and deduplication of BibTeX bibliographies.
//!
//! `btcleaner` takes the records of a bibliography, tidies their fields,
//! replaces full journal names with their official abbreviations (asking the
//! user whenever the fuzzy match is not convincing), and finally looks for
//! entries that are probably the same article cited twice.
//!
//! # Features
//!
//! - `regex` - Use the `regex` crate for pattern matching (enabled by default)
//! - `lite` - Use `regex-lite` instead of `regex`
//! - `fetch` - Download abbreviation lists over HTTP (enabled by default)
//! - `diagnostics` - Render parse errors with source context
//! - `cli` - Build the `btcleaner` command-line tool (enabled by default)
//!
//! # Basic Usage
//!
//! ```rust
//! use btcleaner::{AbbreviationTable, BibTexParser, Cleaner, Run, ScriptedPrompt};
//!
//! let input = r#"@article{kitten2020,
//!   title = {the life of kittens},
//!   journal = {Journal of Kittens},
//!   pages = {1-10},
//!   volume = {3}
//! }"#;
//!
//! let bibliography = BibTexParser::new().parse(input).unwrap();
//! let table = AbbreviationTable::from_lines(["Journal of Kittens;J. Kitt."]);
//!
//! let cleaner = Cleaner::new(table);
//! let mut run = Run::new();
//! let mut prompt = ScriptedPrompt::default();
//! cleaner
//!     .process_all(&mut run, bibliography.records, &mut prompt)
//!     .unwrap();
//!
//! let record = &run.records()[0];
//! assert_eq!(record.title.as_deref(), Some("The Life of Kittens"));
//! assert_eq!(record.journal.as_deref(), Some("J. Kitt."));
//! assert_eq!(record.pages.as_deref(), Some("1--10"));
//! ```
//!
//! # Interactive Decisions
//!
//! Every question the library needs answered goes through the [`Prompt`]
//! trait. A prompt may fail with [`PromptError::Cancelled`], which stops the
//! run before anything has been written back to disk.
//!
//! ```rust
//! use btcleaner::{AbbreviationTable, Cleaner, Record, Run, ScriptedPrompt};
//!
//! let table = AbbreviationTable::from_lines(["Journal of Kittens;J. Kitt."]);
//! let cleaner = Cleaner::new(table);
//! let mut run = Run::new();
//!
//! let mut record = Record::new("article", "cats1999");
//! record.title = Some("Cats".to_string());
//! record.journal = Some("Jrnl of Kitens".to_string());
//!
//! // Answer "yes" to the low-confidence suggestion.
//! let mut prompt = ScriptedPrompt::new(["y"]);
//! cleaner.process(&mut run, record, &mut prompt).unwrap();
//! assert_eq!(prompt.asked().len(), 1);
//! assert_eq!(run.records()[0].journal.as_deref(), Some("J. Kitt."));
//! ```
//!
//! # Error Handling
//!
//! Errors that end a run are reported as [`CleanerError`]. Records missing a
//! required field are not errors of the run: they are kept in the output and
//! listed in the run's [`Summary`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod abbrev;
pub mod bibtex;
pub mod cache;
pub mod config;
pub mod dedupe;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod resolve;

// Reexports
pub use abbrev::AbbreviationTable;
pub use bibtex::{BibTexParser, Bibliography};
pub use cache::AbbreviationCache;
pub use config::CleanerConfig;
pub use dedupe::{DedupeKey, DuplicateCluster};
#[cfg(feature = "diagnostics")]
pub use diagnostics::parse_with_diagnostics;
pub use error::{
    CacheError, CleanerError, ConfigError, ParseError, PromptError, SourceSpan, ValueError,
};
pub use matcher::{JournalMatch, JournalMatcher};
pub use pipeline::{Cleaner, Processed, RecordFailure, Run, Stats, Summary};
pub use resolve::{Decision, History, Prompt, Resolver, ScriptedPrompt};

mod regex;
mod utils;

use error::fields;

/// A single bibliography entry.
///
/// The fields the cleaner reads or rewrites have their own slots; every other
/// field is carried through untouched in `extra_fields`, in the order it was
/// first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entry type tag, e.g. `article`
    pub entry_type: String,
    /// Citation key
    pub id: String,
    /// Title of the work
    pub title: Option<String>,
    /// Journal name or abbreviation
    pub journal: Option<String>,
    /// Author list
    pub author: Option<String>,
    /// Publication month
    pub month: Option<String>,
    /// Page range
    pub pages: Option<String>,
    /// Volume number
    pub volume: Option<String>,
    /// Additional fields not covered by the slots above
    pub extra_fields: IndexMap<String, String>,
}

impl Record {
    /// Create a record with the given entry type and citation key and no fields.
    pub fn new(entry_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    /// Look up a field by its name.
    ///
    /// `ENTRYTYPE` and `ID` address the entry type and citation key.
    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            fields::ENTRY_TYPE => non_empty(&self.entry_type),
            fields::ID => non_empty(&self.id),
            fields::TITLE => self.title.as_deref(),
            fields::JOURNAL => self.journal.as_deref(),
            fields::AUTHOR => self.author.as_deref(),
            fields::MONTH => self.month.as_deref(),
            fields::PAGES => self.pages.as_deref(),
            fields::VOLUME => self.volume.as_deref(),
            other => self.extra_fields.get(other).map(String::as_str),
        }
    }

    /// Set a field by its name, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            fields::ENTRY_TYPE => self.entry_type = value,
            fields::ID => self.id = value,
            fields::TITLE => self.title = Some(value),
            fields::JOURNAL => self.journal = Some(value),
            fields::AUTHOR => self.author = Some(value),
            fields::MONTH => self.month = Some(value),
            fields::PAGES => self.pages = Some(value),
            fields::VOLUME => self.volume = Some(value),
            other => {
                self.extra_fields.insert(other.to_string(), value);
            }
        }
    }

    /// Remove a field by its name, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        match name {
            fields::ENTRY_TYPE => non_empty(&self.entry_type)
                .is_some()
                .then(|| std::mem::take(&mut self.entry_type)),
            fields::ID => non_empty(&self.id)
                .is_some()
                .then(|| std::mem::take(&mut self.id)),
            fields::TITLE => self.title.take(),
            fields::JOURNAL => self.journal.take(),
            fields::AUTHOR => self.author.take(),
            fields::MONTH => self.month.take(),
            fields::PAGES => self.pages.take(),
            fields::VOLUME => self.volume.take(),
            other => self.extra_fields.shift_remove(other),
        }
    }

    /// All fields except the entry type and citation key, in output order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            (fields::AUTHOR, &self.author),
            (fields::TITLE, &self.title),
            (fields::JOURNAL, &self.journal),
            (fields::VOLUME, &self.volume),
            (fields::PAGES, &self.pages),
            (fields::MONTH, &self.month),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .chain(
            self.extra_fields
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }

    /// One [`ValueError::MissingValue`] per required field this record lacks.
    pub fn missing_required(&self) -> Vec<ValueError> {
        fields::REQUIRED
            .iter()
            .filter(|&&name| self.get(name).is_none())
            .map(|&name| ValueError::MissingValue {
                field: name,
                key: name,
            })
            .collect()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Record {
        let mut record = Record::new("article", "smith2020");
        record.set("title", "A Title");
        record.set("journal", "Journal of Kittens");
        record.set("doi", "10.1000/kitt");
        record.set("keywords", "cats; dogs");
        record
    }

    #[test]
    fn test_set_routes_known_fields_to_slots() {
        let record = sample();
        assert_eq!(record.title.as_deref(), Some("A Title"));
        assert_eq!(record.journal.as_deref(), Some("Journal of Kittens"));
        assert_eq!(record.extra_fields.len(), 2);
        assert_eq!(record.get("doi"), Some("10.1000/kitt"));
        assert_eq!(record.get("ID"), Some("smith2020"));
        assert_eq!(record.get("ENTRYTYPE"), Some("article"));
    }

    #[test]
    fn test_remove_preserves_extra_field_order() {
        let mut record = sample();
        record.set("note", "n");
        assert_eq!(record.remove("keywords"), Some("cats; dogs".to_string()));
        let names: Vec<&str> = record.extra_fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["doi", "note"]);
        assert_eq!(record.remove("missing"), None);
    }

    #[test]
    fn test_fields_output_order() {
        let mut record = sample();
        record.set("pages", "1--2");
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["title", "journal", "pages", "doi", "keywords"]);
    }

    #[test]
    fn test_missing_required() {
        assert!(sample().missing_required().is_empty());

        let mut record = Record::new("article", "");
        record.title = Some("Only a title".to_string());
        let missing = record.missing_required();
        assert_eq!(
            missing,
            vec![
                ValueError::MissingValue {
                    field: fields::ID,
                    key: fields::ID
                },
                ValueError::MissingValue {
                    field: fields::JOURNAL,
                    key: fields::JOURNAL
                },
            ]
        );
    }
}
