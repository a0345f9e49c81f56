//! Journal abbreviation tables.
//!
//! An [`AbbreviationTable`] maps full journal names to their official
//! abbreviations. Iteration follows insertion order, which makes fuzzy-match
//! tie-breaking deterministic.
//!
//! # Example
//!
//! ```
//! use btcleaner::AbbreviationTable;
//!
//! let table = AbbreviationTable::from_lines([
//!     "Journal of Kittens;J. Kitt.",
//!     "Annals of Cats (London)=Ann. Cats (London)",
//! ]);
//!
//! assert_eq!(table.get("Journal of Kittens"), Some("J. Kitt."));
//! assert_eq!(table.get("Annals of Cats"), Some("Ann. Cats"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Delimiters accepted between a full name and its abbreviation, in order of preference.
const DELIMITERS: [char; 2] = [';', '='];

/// Mapping from full journal name to abbreviation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbbreviationTable {
    entries: IndexMap<String, String>,
}

impl AbbreviationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `full name;abbreviation` (or `full name=abbreviation`) lines.
    ///
    /// Quotes and whitespace around either side are trimmed, columns past the
    /// second are ignored, and lines without a usable pair are skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        table.extend_custom(lines);
        table
    }

    /// Merge `full name;abbreviation` lines into the table.
    ///
    /// Entries for names already present replace the old abbreviation.
    /// Returns the number of lines that yielded an entry.
    pub fn extend_custom<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| parse_line(line.as_ref()))
            .map(|(name, abbreviation)| self.insert(name, abbreviation))
            .count()
    }

    /// Insert one entry.
    ///
    /// A name carrying a parenthetical, such as `Journal Name (City)`, also
    /// registers `Journal Name` with the parenthetical stripped from the
    /// abbreviation as well.
    pub fn insert(&mut self, name: impl Into<String>, abbreviation: impl Into<String>) {
        let name = name.into();
        let abbreviation = abbreviation.into();
        let stripped = name.split_once('(').and_then(|(stripped_name, _)| {
            let stripped_name = stripped_name.trim();
            let stripped_abbreviation = abbreviation
                .split_once('(')
                .map_or(abbreviation.as_str(), |(head, _)| head)
                .trim();
            (!stripped_name.is_empty())
                .then(|| (stripped_name.to_string(), stripped_abbreviation.to_string()))
        });
        self.entries.insert(name, abbreviation);
        if let Some((stripped_name, stripped_abbreviation)) = stripped {
            self.entries.insert(stripped_name, stripped_abbreviation);
        }
    }

    /// Abbreviation registered for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// `(full name, abbreviation)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, abbreviation)| (name.as_str(), abbreviation.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to `full name;abbreviation` lines.
    pub fn to_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(name, abbreviation)| format_line(name, abbreviation))
            .collect()
    }
}

/// Format a single entry the way [`AbbreviationTable::from_lines`] reads it.
pub fn format_line(name: &str, abbreviation: &str) -> String {
    format!("{name};{abbreviation}")
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let delimiter = DELIMITERS.into_iter().find(|&d| line.contains(d))?;
    let mut columns = line.split(delimiter).map(clean_column);
    let name = columns.next().filter(|s| !s.is_empty())?;
    let abbreviation = columns.next().filter(|s| !s.is_empty())?;
    Some((name.to_string(), abbreviation.to_string()))
}

fn clean_column(column: &str) -> &str {
    column.trim().trim_matches('"').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Journal of Kittens;J. Kitt.", Some(("Journal of Kittens", "J. Kitt.")))]
    #[case("Journal of Kittens=J. Kitt.", Some(("Journal of Kittens", "J. Kitt.")))]
    #[case("  Journal of Kittens ; J. Kitt. ", Some(("Journal of Kittens", "J. Kitt.")))]
    #[case("\"Journal of Kittens\";\"J. Kitt.\";\"JK\"", Some(("Journal of Kittens", "J. Kitt.")))]
    #[case("Journal of Kittens", None)]
    #[case("Journal of Kittens;", None)]
    #[case(";J. Kitt.", None)]
    #[case("", None)]
    fn test_parse_line(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        let parsed = parse_line(line);
        assert_eq!(
            parsed.as_ref().map(|(n, a)| (n.as_str(), a.as_str())),
            expected
        );
    }

    #[test]
    fn test_parenthetical_duplicate_entry() {
        let table = AbbreviationTable::from_lines(["Annals of Cats (London);Ann. Cats (London)"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Annals of Cats (London)"), Some("Ann. Cats (London)"));
        assert_eq!(table.get("Annals of Cats"), Some("Ann. Cats"));
        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Annals of Cats (London)", "Annals of Cats"]);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let table = AbbreviationTable::from_lines(["B Journal;B J.", "A Journal;A J.", "C Journal;C J."]);
        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["B Journal", "A Journal", "C Journal"]);
    }

    #[test]
    fn test_extend_custom_overrides() {
        let mut table = AbbreviationTable::from_lines(["Journal of Kittens;J. Kitt."]);
        let added = table.extend_custom(["Journal of Kittens;JOK", "garbage", "Cat Letters;Cat Lett."]);
        assert_eq!(added, 2);
        assert_eq!(table.get("Journal of Kittens"), Some("JOK"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_to_lines_reads_back() {
        let table = AbbreviationTable::from_lines(["Journal of Kittens;J. Kitt.", "Cat Letters=Cat Lett."]);
        assert_eq!(table.to_lines(), vec!["Journal of Kittens;J. Kitt.", "Cat Letters;Cat Lett."]);
        assert_eq!(AbbreviationTable::from_lines(table.to_lines()), table);
    }
}
