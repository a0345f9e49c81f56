//! BibTeX reading and writing.
//!
//! Parses a `.bib` file into a [`Bibliography`] of [`Record`]s with the
//! [`biblatex`] crate and writes it back out. Field names and entry types are
//! lowercased, and `@string` macros (including the standard month macros) and
//! `#` concatenation are expanded at parse time.
//!
//! # Example
//!
//! ```
//! use btcleaner::BibTexParser;
//!
//! let input = r#"@string{jk = {Journal of Kittens}}
//!
//! @Article{smith2020,
//!   Title = "Kittens",
//!   journal = jk,
//!   year = 2020
//! }"#;
//!
//! let bibliography = BibTexParser::new().parse(input).unwrap();
//! let record = &bibliography.records[0];
//! assert_eq!(record.journal.as_deref(), Some("Journal of Kittens"));
//!
//! let output = bibliography.to_bibtex_string();
//! assert!(output.contains(" journal = {Journal of Kittens}"));
//! ```

mod latex;
mod parse;

pub use latex::{latex_escape, page_double_hyphen};
pub(crate) use latex::PAGE_SEPARATORS;

use crate::error::ParseError;
use crate::utils::with_newline;
use crate::Record;
use itertools::Itertools;
use parse::bibtex_parse;
use std::collections::HashMap;

/// Parser for BibTeX files.
#[derive(Debug, Clone, Default)]
pub struct BibTexParser;

impl BibTexParser {
    /// Creates a new BibTeX parser instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parses the full text of a BibTeX file.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` carrying the line and byte span of the entry
    /// that could not be read.
    pub fn parse(&self, input: &str) -> Result<Bibliography, ParseError> {
        bibtex_parse(input)
    }
}

/// The entries of a BibTeX file.
///
/// `@comment` and `@preamble` blocks are not kept, and `@string` macros are
/// already expanded into the values that used them.
#[derive(Debug, Clone, PartialEq)]
pub struct Bibliography {
    /// Entries, in file order
    pub records: Vec<Record>,
    pub(crate) newline: &'static str,
}

impl Default for Bibliography {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            newline: "\n",
        }
    }
}

impl Bibliography {
    /// A bibliography of `records`, written with `\n` line endings.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Records by citation key; the first record wins for repeated keys.
    pub fn entries_by_id(&self) -> HashMap<&str, &Record> {
        let mut entries = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            entries.entry(record.id.as_str()).or_insert(record);
        }
        entries
    }

    /// Render the bibliography as BibTeX text.
    ///
    /// Every value is written in braces, one field per line. Lines end the
    /// way they did in the parsed input.
    pub fn to_bibtex_string(&self) -> String {
        let mut text = self.records.iter().map(format_record).join("\n\n");
        if !text.is_empty() {
            text.push('\n');
        }
        with_newline(text, self.newline)
    }
}

fn format_record(record: &Record) -> String {
    let fields: Vec<String> = record
        .fields()
        .map(|(name, value)| format!(" {name} = {{{value}}}"))
        .collect();
    if fields.is_empty() {
        format!("@{}{{{},\n}}", record.entry_type, record.id)
    } else {
        format!(
            "@{}{{{},\n{}\n}}",
            record.entry_type,
            record.id,
            fields.join(",\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_entry() {
        let mut record = Record::new("article", "smith2020");
        record.set("journal", "J. Kitt.");
        record.set("title", "Kittens");
        record.set("year", "2020");
        record.set("author", "{Smith, John}");
        let bibliography = Bibliography::from_records(vec![record]);
        assert_eq!(
            bibliography.to_bibtex_string(),
            "@article{smith2020,\n author = {{Smith, John}},\n title = {Kittens},\n journal = {J. Kitt.},\n year = {2020}\n}\n"
        );
    }

    #[test]
    fn test_write_expands_strings_and_keeps_newlines() {
        let input = "@string{jk = \"Journal of Kittens\"}\r\n@misc{a,\r\n  note = jk\r\n}\r\n@misc{b,\r\n  note = {Dogs}\r\n}\r\n";
        let bibliography = BibTexParser::new().parse(input).unwrap();
        assert_eq!(
            bibliography.to_bibtex_string(),
            "@misc{a,\r\n note = {Journal of Kittens}\r\n}\r\n\r\n@misc{b,\r\n note = {Dogs}\r\n}\r\n"
        );
    }

    #[test]
    fn test_written_text_parses_back() {
        let input = r#"@article{a,
  title = {The {DNA} of Cats},
  journal = {J. Kitt.},
  pages = {1--10},
  volume = {3},
  doi = {10.1000/x}
}

@book{b, title = "Dogs", publisher = {Kennel Press}}
"#;
        let bibliography = BibTexParser::new().parse(input).unwrap();
        let reparsed = BibTexParser::new()
            .parse(&bibliography.to_bibtex_string())
            .unwrap();
        assert_eq!(reparsed, bibliography);
    }

    #[test]
    fn test_entries_by_id_prefers_first() {
        let mut first = Record::new("article", "dup");
        first.set("title", "First");
        let mut second = Record::new("article", "dup");
        second.set("title", "Second");
        let bibliography = Bibliography::from_records(vec![first, second]);
        let entries = bibliography.entries_by_id();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["dup"].title.as_deref(), Some("First"));
    }

    #[test]
    fn test_empty_bibliography_writes_nothing() {
        assert_eq!(Bibliography::default().to_bibtex_string(), "");
    }
}
