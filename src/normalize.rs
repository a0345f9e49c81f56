//! Field normalization.
//!
//! Pure, deterministic clean-up of individual record fields: headline
//! capitalization of titles, numeric months, `and`-separated author lists,
//! and removal of fields that make no sense in a shared bibliography.

use crate::Record;
use crate::regex::Regex;
use itertools::Itertools;
use std::sync::LazyLock;

static SMALL_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:a|an|and|as|at|but|by|en|for|if|in|nor|of|on|or|per|the|to|v\.?|via|vs\.?)$")
        .unwrap()
});

/// Characters that mark a word as markup, a path, or an address.
const VERBATIM_MARKERS: [char; 7] = ['\\', '{', '}', '$', '/', '@', '_'];

/// Sentinel returned by [`convert_month`] for input it does not recognize.
pub const UNKNOWN_MONTH: &str = "0";

/// Convert a title to headline capitalization.
///
/// Small words (articles, short conjunctions and prepositions) are lowercased
/// unless they open the title, close it, or follow a colon. Words with
/// capitals past their first letter (acronyms, `McDonald`, `iPhone`), words
/// starting with a digit, and LaTeX or URL fragments are left as written.
/// Whitespace is preserved exactly, and applying the function twice gives the
/// same result as applying it once.
///
/// # Examples
///
/// ```
/// use btcleaner::normalize::titlecase;
///
/// assert_eq!(titlecase("the structure of DNA"), "The Structure of DNA");
/// ```
pub fn titlecase(text: &str) -> String {
    let spans = word_spans(text);
    let last = spans.len().saturating_sub(1);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut phrase_start = true;
    for (i, &(start, end)) in spans.iter().enumerate() {
        out.push_str(&text[cursor..start]);
        let word = &text[start..end];
        out.push_str(&titlecase_word(word, phrase_start || i == last));
        phrase_start = word.ends_with([':', '?', '!']);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Byte spans of the whitespace-separated words of `text`.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn titlecase_word(word: &str, capitalize_small: bool) -> String {
    if is_verbatim(word) {
        return word.to_string();
    }
    if word.contains('-') {
        // The first part always opens a compound: "In-House", "State-of-the-Art".
        return word
            .split('-')
            .enumerate()
            .map(|(i, part)| titlecase_part(part, i == 0))
            .join("-");
    }
    titlecase_part(word, capitalize_small)
}

fn titlecase_part(part: &str, capitalize_small: bool) -> String {
    if is_verbatim(part) {
        return part.to_string();
    }
    let core = part.trim_matches(|c: char| !c.is_alphanumeric() && c != '.');
    if !capitalize_small && SMALL_WORDS.is_match(core) {
        return part.to_lowercase();
    }
    capitalize_first_letter(part)
}

fn is_verbatim(word: &str) -> bool {
    if word.contains(VERBATIM_MARKERS) {
        return true;
    }
    let body = word.trim_start_matches(|c: char| !c.is_alphanumeric());
    if body.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    // Dotted forms like "e.g." or "www.example.org"
    if word.trim_end_matches(|c: char| !c.is_alphanumeric()).contains('.') {
        return true;
    }
    word.chars()
        .filter(|c| c.is_alphabetic())
        .skip(1)
        .any(char::is_uppercase)
}

fn capitalize_first_letter(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut done = false;
    for c in part.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a month name, three-letter abbreviation, or number to `"1"`..`"12"`.
///
/// Matching is case-insensitive; anything unrecognized becomes
/// [`UNKNOWN_MONTH`].
pub fn convert_month(month: &str) -> String {
    parse_month(month).map_or_else(|| UNKNOWN_MONTH.to_string(), |m| m.to_string())
}

fn parse_month(month: &str) -> Option<u8> {
    let month = month.trim();
    if let Ok(number) = month.parse::<u8>() {
        return (1..=12).contains(&number).then_some(number);
    }
    match month.to_lowercase().as_str() {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

/// Rewrite a comma-separated `Last, First, Last, First` author list.
///
/// Each `Last, First` pair is wrapped in braces, so later processing treats
/// it as a literal unit, and the pairs are joined with `" and "`. Returns
/// `None` when the field already uses `" and "` or has no comma, in which
/// case it is left alone.
///
/// # Examples
///
/// ```
/// use btcleaner::normalize::normalize_authors;
///
/// assert_eq!(
///     normalize_authors("Smith, J., Doe, A.").as_deref(),
///     Some("{Smith, J.} and {Doe, A.}")
/// );
/// assert_eq!(normalize_authors("Smith, J. and Doe, A."), None);
/// ```
pub fn normalize_authors(author: &str) -> Option<String> {
    if author.contains(" and ") || !author.contains(',') {
        return None;
    }
    let names = author
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .chunks(2)
        .into_iter()
        .map(|mut name| format!("{{{}}}", name.join(", ")))
        .join(" and ");
    Some(names)
}

/// Remove the named fields from a record, returning how many were present.
pub fn strip_fields<S: AsRef<str>>(record: &mut Record, names: &[S]) -> usize {
    names
        .iter()
        .filter(|name| record.remove(name.as_ref()).is_some())
        .count()
}
