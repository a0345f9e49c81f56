//! Duplicate detection.
//!
//! Two records are suspected duplicates when they start on the same page of
//! the same volume. Detection happens once, after every record has been
//! cleaned; the user then picks which member of each cluster survives.
//!
//! ## Clustering
//!
//! Eligible records are taken from the end of the list one at a time. Each
//! one becomes the anchor of a cluster holding every *remaining* record with
//! an equal [`DedupeKey`]. Membership is decided against the anchor only: a
//! record is never pulled into a cluster through another member. Three
//! records with the same key therefore produce two clusters, the second one
//! nested in the first; once the first has been resolved, the second is only
//! presented if at least two of its members are still in the list.
//!
//! # Example
//!
//! ```
//! use btcleaner::{Record, dedupe::find_duplicates};
//!
//! let mut first = Record::new("article", "smith2020");
//! first.set("journal", "J. Kitt.");
//! first.set("title", "Kittens");
//! first.set("pages", "100-110");
//! first.set("volume", "5");
//!
//! let mut second = first.clone();
//! second.id = "smith2020b".to_string();
//! second.set("pages", "100-120");
//!
//! let clusters = find_duplicates(&[first, second]);
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].anchor, "smith2020b");
//! assert_eq!(clusters[0].others, vec!["smith2020"]);
//! ```

use crate::bibtex::PAGE_SEPARATORS;
use crate::error::PromptError;
use crate::resolve::Prompt;
use crate::Record;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Clustering key: first page and volume of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    pub first_page: String,
    pub volume: String,
}

impl DedupeKey {
    /// Derive the key of a record; `None` unless both parts are non-empty.
    pub fn from_record(record: &Record) -> Option<Self> {
        let first_page = first_page(record.pages.as_deref()?);
        let volume = record.volume.as_deref()?.trim();
        if first_page.is_empty() || volume.is_empty() {
            return None;
        }
        Some(Self {
            first_page: first_page.to_string(),
            volume: volume.to_string(),
        })
    }
}

/// First page of a page range: everything before the first hyphen or dash.
///
/// A value starting with a dash has no first page.
pub fn first_page(pages: &str) -> &str {
    pages
        .trim()
        .split(&PAGE_SEPARATORS[..])
        .next()
        .unwrap_or_default()
        .trim()
}

/// A record's key together with its citation key.
#[derive(Debug, Clone)]
pub(crate) struct DedupeEntry {
    pub(crate) key: DedupeKey,
    pub(crate) id: String,
}

/// Citation keys of records suspected to be the same work.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCluster {
    /// The shared key.
    pub key: DedupeKey,
    /// The record the cluster was built around.
    pub anchor: String,
    /// Records whose key equals the anchor's.
    pub others: Vec<String>,
}

impl DuplicateCluster {
    /// Anchor first, then the other members in list order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.anchor.as_str()).chain(self.others.iter().map(String::as_str))
    }
}

/// Cluster the eligible records of `records` by [`DedupeKey`].
///
/// Records missing a required field, or lacking a first page or a volume,
/// are never clustered.
pub fn find_duplicates(records: &[Record]) -> Vec<DuplicateCluster> {
    let entries = records
        .iter()
        .filter(|record| record.missing_required().is_empty())
        .filter_map(|record| {
            DedupeKey::from_record(record).map(|key| DedupeEntry {
                key,
                id: record.id.clone(),
            })
        })
        .collect();
    cluster(entries)
}

pub(crate) fn cluster(mut entries: Vec<DedupeEntry>) -> Vec<DuplicateCluster> {
    let mut clusters: IndexMap<String, DuplicateCluster> = IndexMap::new();
    while let Some(anchor) = entries.pop() {
        for other in entries.iter().filter(|entry| entry.key == anchor.key) {
            clusters
                .entry(anchor.id.clone())
                .or_insert_with(|| DuplicateCluster {
                    key: anchor.key.clone(),
                    anchor: anchor.id.clone(),
                    others: Vec::new(),
                })
                .others
                .push(other.id.clone());
        }
    }
    clusters.into_values().collect()
}

/// Ask the user which member of each cluster to keep, deleting the rest.
///
/// Members are numbered from 1 in the prompt. An answer that is not one of
/// those numbers keeps every member. Clusters with fewer than two members
/// still present in `records` are skipped without asking. Returns the number
/// of records deleted.
///
/// # Errors
///
/// Propagates the prompt's error; deletions already made stay made.
pub fn resolve_duplicates(
    clusters: &[DuplicateCluster],
    records: &mut Vec<Record>,
    prompt: &mut dyn Prompt,
) -> Result<usize, PromptError> {
    let mut removed = 0;
    for cluster in clusters {
        let members: Vec<Record> = cluster
            .members()
            .filter_map(|id| records.iter().find(|record| record.id == id).cloned())
            .collect();
        if members.len() < 2 {
            debug!(anchor = %cluster.anchor, "Skipping cluster already resolved");
            continue;
        }

        let answer = prompt.ask(&describe(&members))?;
        let keep = answer
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=members.len()).contains(n));
        let Some(keep) = keep else {
            info!("Keeping all.");
            continue;
        };

        info!("Keeping {}.", members[keep - 1].id);
        for (_, member) in members.iter().enumerate().filter(|(i, _)| i + 1 != keep) {
            if let Some(position) = records.iter().position(|record| record.id == member.id) {
                let deleted = records.remove(position);
                info!("Deleting {}", deleted.id);
                removed += 1;
            }
        }
    }
    Ok(removed)
}

fn describe(members: &[Record]) -> String {
    let mut text = String::from("Possible duplicates:\n\n");
    for (i, member) in members.iter().enumerate() {
        text.push_str(&format!(
            "{}):   {}\nJournal: {}\nVolume: {}\nPages: {}\n\n",
            i + 1,
            member.id,
            member.journal.as_deref().unwrap_or("-"),
            member.volume.as_deref().unwrap_or("-"),
            member.pages.as_deref().unwrap_or("-"),
        ));
    }
    text.push_str("Keep which one? ");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedPrompt;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn article(id: &str, pages: &str, volume: &str) -> Record {
        let mut record = Record::new("article", id);
        record.set("title", "A Title");
        record.set("journal", "J. Kitt.");
        record.set("pages", pages);
        record.set("volume", volume);
        record
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[rstest]
    #[case("100-110", "100")]
    #[case("100--110", "100")]
    #[case(" 100 - 110 ", "100")]
    #[case("e1234", "e1234")]
    #[case("100\u{2013}110", "100")]
    #[case("-12", "")]
    #[case("", "")]
    fn test_first_page(#[case] pages: &str, #[case] expected: &str) {
        assert_eq!(first_page(pages), expected);
    }

    #[test]
    fn test_key_requires_page_and_volume() {
        assert!(DedupeKey::from_record(&article("a", "100-110", "5")).is_some());
        assert!(DedupeKey::from_record(&article("a", "", "5")).is_none());
        assert!(DedupeKey::from_record(&article("a", "100", "")).is_none());
        assert!(DedupeKey::from_record(&Record::new("article", "a")).is_none());
    }

    #[test]
    fn test_equal_keys_share_a_cluster() {
        let records = vec![article("a", "100-110", "5"), article("b", "100-120", "5")];
        let clusters = find_duplicates(&records);
        assert_eq!(clusters.len(), 1);
        assert_eq!(
            clusters[0].key,
            DedupeKey {
                first_page: "100".into(),
                volume: "5".into()
            }
        );
        let members: Vec<&str> = clusters[0].members().collect();
        assert_eq!(members, vec!["b", "a"]);
    }

    #[test]
    fn test_different_keys_never_cluster() {
        let records = vec![
            article("a", "100-110", "5"),
            article("b", "100-110", "6"),
            article("c", "101-110", "5"),
        ];
        assert!(find_duplicates(&records).is_empty());
    }

    #[test]
    fn test_incomplete_records_are_not_clustered() {
        let mut broken = article("b", "100-110", "5");
        broken.journal = None;
        let records = vec![article("a", "100-110", "5"), broken];
        assert!(find_duplicates(&records).is_empty());
    }

    /// Clusters are anchored: three equal keys give a cluster per anchor.
    #[test]
    fn test_anchored_clusters_for_three_equal_keys() {
        let records = vec![
            article("a", "7-9", "1"),
            article("b", "7-9", "1"),
            article("c", "7-9", "1"),
        ];
        let clusters = find_duplicates(&records);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].anchor, "c");
        assert_eq!(clusters[0].others, vec!["a", "b"]);
        assert_eq!(clusters[1].anchor, "b");
        assert_eq!(clusters[1].others, vec!["a"]);
    }

    #[test]
    fn test_out_of_range_answer_keeps_all() {
        let mut records = vec![article("a", "100-110", "5"), article("b", "100-120", "5")];
        let clusters = find_duplicates(&records);
        for answer in ["3", "0", "first", ""] {
            let mut prompt = ScriptedPrompt::new([answer]);
            let removed = resolve_duplicates(&clusters, &mut records, &mut prompt).unwrap();
            assert_eq!(removed, 0);
            assert_eq!(ids(&records), vec!["a", "b"]);
        }
    }

    #[test]
    fn test_keep_one_deletes_the_others() {
        let mut records = vec![
            article("a", "100-110", "5"),
            article("x", "1-2", "9"),
            article("b", "100-120", "5"),
        ];
        let clusters = find_duplicates(&records);
        // Members are presented anchor first: 1) b, 2) a
        let mut prompt = ScriptedPrompt::new(["2"]);
        let removed = resolve_duplicates(&clusters, &mut records, &mut prompt).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ids(&records), vec!["a", "x"]);
        assert!(prompt.asked()[0].contains("1):   b"));
        assert!(prompt.asked()[0].contains("2):   a"));
        assert!(prompt.asked()[0].ends_with("Keep which one? "));
    }

    #[test]
    fn test_resolved_nested_cluster_is_skipped() {
        let mut records = vec![
            article("a", "7-9", "1"),
            article("b", "7-9", "1"),
            article("c", "7-9", "1"),
        ];
        let clusters = find_duplicates(&records);
        let mut prompt = ScriptedPrompt::new([" 1 "]);
        let removed = resolve_duplicates(&clusters, &mut records, &mut prompt).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(ids(&records), vec!["c"]);
        assert_eq!(prompt.asked().len(), 1);
    }

    #[test]
    fn test_cancellation_propagates() {
        let mut records = vec![article("a", "100-110", "5"), article("b", "100-120", "5")];
        let clusters = find_duplicates(&records);
        let mut prompt = ScriptedPrompt::default().then_fail(PromptError::Cancelled);
        let result = resolve_duplicates(&clusters, &mut records, &mut prompt);
        assert_eq!(result, Err(PromptError::Cancelled));
        assert_eq!(records.len(), 2);
    }
}
