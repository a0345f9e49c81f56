//! Fuzzy journal matching.
//!
//! A [`JournalMatcher`] proposes the abbreviation that best fits a journal
//! string, together with a similarity score in `[0, 1]`. The stock
//! implementation is a linear scan over an [`AbbreviationTable`]; a faster
//! index can be slotted in behind the same trait.

use crate::AbbreviationTable;
use strsim::normalized_levenshtein;

/// The best abbreviation found for a journal string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalMatch {
    /// Proposed abbreviation; empty when nothing was compared.
    pub candidate: String,
    /// Similarity in `[0, 1]`; `1.0` only for an exact match.
    pub score: f64,
}

impl JournalMatch {
    /// A match with nothing to offer: empty candidate, score zero.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Source of abbreviation candidates for journal strings.
pub trait JournalMatcher {
    /// Find the best abbreviation for `journal`.
    fn best_match(&self, journal: &str) -> JournalMatch;
}

/// Normalized edit-distance similarity of two strings.
///
/// `1.0` for identical strings, approaching `0.0` as they diverge.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

impl JournalMatcher for AbbreviationTable {
    /// Compare `journal` against every full name and every abbreviation.
    ///
    /// The abbreviation of the highest-scoring entry wins; on ties the entry
    /// inserted first is kept. An empty table yields [`JournalMatch::none`].
    fn best_match(&self, journal: &str) -> JournalMatch {
        let mut best = JournalMatch::none();
        for (name, abbreviation) in self.iter() {
            let score = similarity(journal, name).max(similarity(journal, abbreviation));
            if score > best.score {
                best = JournalMatch {
                    candidate: abbreviation.to_string(),
                    score,
                };
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kittens() -> AbbreviationTable {
        AbbreviationTable::from_lines([
            "Journal of Kittens;J. Kitt.",
            "Journal of Puppies;J. Pupp.",
            "Cat Letters;Cat Lett.",
        ])
    }

    #[test]
    fn test_exact_name_scores_one() {
        let found = kittens().best_match("Journal of Kittens");
        assert_eq!(found.candidate, "J. Kitt.");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_exact_abbreviation_scores_one() {
        let found = kittens().best_match("Cat Lett.");
        assert_eq!(found.candidate, "Cat Lett.");
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_near_miss_scores_below_one() {
        let found = kittens().best_match("Journal of Kitens");
        assert_eq!(found.candidate, "J. Kitt.");
        assert!(found.score > 0.9 && found.score < 1.0);
    }

    #[test]
    fn test_empty_table() {
        let found = AbbreviationTable::new().best_match("Journal of Kittens");
        assert_eq!(found, JournalMatch::none());
        assert_eq!(found.candidate, "");
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn test_ties_keep_first_entry() {
        let table = AbbreviationTable::from_lines(["Journal A;First", "Journal B;Second"]);
        let found = table.best_match("Journal C");
        assert_eq!(found.candidate, "First");
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let table = kittens();
        for journal in ["", "x", "Journal of Kittens", "completely unrelated words", "J."] {
            let found = table.best_match(journal);
            assert!((0.0..=1.0).contains(&found.score), "{journal}: {}", found.score);
            assert_eq!(
                found.score == 1.0,
                table.iter().any(|(n, a)| n == journal || a == journal)
            );
        }
    }
}
