//! The record pipeline.
//!
//! Every record goes through the same fixed sequence of steps:
//!
//! 1. **Field check**: records missing a required field (`ENTRYTYPE`, `ID`,
//!    `title`, `journal`) are kept in the output as they are and listed as
//!    failures; none of the following steps runs for them.
//! 2. **Normalization**: title case, author list, month, stripped fields.
//! 3. **Journal resolution**: fuzzy match, then the [`Resolver`].
//! 4. **Finalization**: the record's [`DedupeKey`] is noted, the journal is
//!    LaTeX-escaped and the page range gets its double hyphen.
//!
//! All state that outlives a single record (output list, failures, resolver
//! history, counters) lives in a [`Run`] owned by the caller. Duplicate
//! detection runs once at the end through [`Run::deduplicate`].

use crate::abbrev::format_line;
use crate::bibtex::{latex_escape, page_double_hyphen};
use crate::config::{CleanerConfig, DEFAULT_STRIP_FIELDS};
use crate::dedupe::{cluster, resolve_duplicates, DedupeEntry, DedupeKey};
use crate::error::{fields, CleanerError, ValueError};
use crate::matcher::JournalMatcher;
use crate::normalize::{convert_month, normalize_authors, strip_fields, titlecase, UNKNOWN_MONTH};
use crate::resolve::{Decision, History, Prompt, Resolver};
use crate::{AbbreviationTable, Record};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Cleans records one at a time against a journal matcher.
#[derive(Debug, Clone)]
pub struct Cleaner<M = AbbreviationTable> {
    matcher: M,
    resolver: Resolver,
    strip_fields: Vec<String>,
}

impl<M: JournalMatcher> Cleaner<M> {
    /// A cleaner with the default threshold and stripped fields.
    pub fn new(matcher: M) -> Self {
        Self {
            matcher,
            resolver: Resolver::new(),
            strip_fields: DEFAULT_STRIP_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A cleaner using the threshold and stripped fields of `config`.
    pub fn with_config(matcher: M, config: &CleanerConfig) -> Self {
        Self {
            matcher,
            resolver: Resolver::new().with_threshold(config.accept_threshold()),
            strip_fields: config.strip_fields().to_vec(),
        }
    }

    /// The journal matcher in use.
    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// The resolver deciding on replacements.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Run one record through the pipeline and append it to `run`.
    ///
    /// A record failing the field check is not an error: it is appended
    /// unchanged and reported as [`Processed::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`CleanerError::Prompt`] when the prompt fails or is
    /// cancelled; the record is then not appended.
    pub fn process<'r>(
        &self,
        run: &'r mut Run,
        mut record: Record,
        prompt: &mut dyn Prompt,
    ) -> Result<Processed<'r>, CleanerError> {
        run.attached = true;
        debug!(id = %record.id, entry_type = %record.entry_type, "Processing record");

        let errors = record.missing_required();
        if !errors.is_empty() {
            warn!(
                entry_type = %record.entry_type,
                id = %record.id,
                "Cannot parse record: {}",
                errors.iter().join(", ")
            );
            run.stats.failed += 1;
            run.records.push(record.clone());
            let index = run.failures.len();
            run.failures.push(RecordFailure { record, errors });
            return Ok(Processed::Failed(&run.failures[index]));
        }

        self.normalize(run, &mut record);
        self.resolve_journal(run, &mut record, prompt)?;

        if let Some(key) = DedupeKey::from_record(&record) {
            run.dedupe.push(DedupeEntry {
                key,
                id: record.id.clone(),
            });
        }
        if let Some(journal) = record.journal.as_mut() {
            *journal = latex_escape(journal);
        }
        if let Some(pages) = record.pages.as_mut() {
            *pages = page_double_hyphen(pages);
        }

        run.stats.parsed += 1;
        let index = run.records.len();
        run.records.push(record);
        Ok(Processed::Cleaned(&run.records[index]))
    }

    /// Run every record of `records` through [`Self::process`], in order.
    ///
    /// The run counts as started even when `records` is empty.
    ///
    /// # Errors
    ///
    /// Stops at the first prompt failure; records already processed stay in `run`.
    pub fn process_all<I>(
        &self,
        run: &mut Run,
        records: I,
        prompt: &mut dyn Prompt,
    ) -> Result<(), CleanerError>
    where
        I: IntoIterator<Item = Record>,
    {
        run.attached = true;
        for record in records {
            self.process(run, record, prompt)?;
        }
        Ok(())
    }

    fn normalize(&self, run: &mut Run, record: &mut Record) {
        if let Some(title) = record.title.as_mut() {
            let cased = titlecase(title);
            if cased != *title {
                run.stats.cleaned += 1;
                *title = cased;
            }
        }
        if let Some(author) = record.author.as_deref().and_then(normalize_authors) {
            record.author = Some(author);
        }
        if let Some(month) = record.month.as_mut() {
            let converted = convert_month(month);
            if converted == UNKNOWN_MONTH {
                warn!(id = %record.id, month = %month, "Unrecognized month");
            }
            *month = converted;
        }
        let stripped = strip_fields(record, &self.strip_fields);
        if stripped > 0 {
            debug!(id = %record.id, stripped, "Removed attachment fields");
        }
    }

    fn resolve_journal(
        &self,
        run: &mut Run,
        record: &mut Record,
        prompt: &mut dyn Prompt,
    ) -> Result<(), CleanerError> {
        let journal = record.journal.clone().unwrap_or_default();
        let found = self.matcher.best_match(&journal);
        let decision = self
            .resolver
            .resolve(prompt, &mut run.history, &journal, &found)?;

        let Some(replacement) = decision
            .replacement()
            .filter(|replacement| !replacement.is_empty() && *replacement != journal)
        else {
            return Ok(());
        };

        info!("{journal} -> {replacement}");
        run.stats.abbreviated += 1;
        if matches!(decision, Decision::Override(_)) {
            run.custom.insert(journal.clone(), replacement.to_string());
        }
        record.journal = Some(replacement.to_string());
        Ok(())
    }
}

/// Outcome of [`Cleaner::process`] for a single record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Processed<'r> {
    /// The record went through every step.
    Cleaned(&'r Record),
    /// The record lacked a required field and was kept unchanged.
    Failed(&'r RecordFailure),
}

/// A record that failed the field check.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub record: Record,
    pub errors: Vec<ValueError>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Records that went through every step
    pub parsed: usize,
    /// Records whose title changed
    pub cleaned: usize,
    /// Records whose journal was replaced
    pub abbreviated: usize,
    /// Duplicate clusters found
    pub duplicates: usize,
    /// Records that failed the field check
    pub failed: usize,
}

/// State of one cleaning run.
#[derive(Debug, Default)]
pub struct Run {
    history: History,
    records: Vec<Record>,
    failures: Vec<RecordFailure>,
    dedupe: Vec<DedupeEntry>,
    custom: IndexMap<String, String>,
    stats: Stats,
    attached: bool,
}

impl Run {
    /// An empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output records, failed ones included, in processing order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Take the output records, failed ones included.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Records that failed the field check.
    pub fn failures(&self) -> &[RecordFailure] {
        &self.failures
    }

    /// Journal decisions made so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Counters for the summary.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Abbreviations typed by the user this run, as `full name;abbreviation` lines.
    pub fn custom_abbreviations(&self) -> Vec<String> {
        self.custom
            .iter()
            .map(|(name, abbreviation)| format_line(name, abbreviation))
            .collect()
    }

    /// Look for duplicates among the cleaned records and let the user pick
    /// which ones to keep. Returns the number of records deleted.
    ///
    /// The duplicate index is consumed: a second call finds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CleanerError::NothingToDeduplicate`] if no record was ever
    /// processed in this run, and [`CleanerError::Prompt`] when the prompt
    /// fails.
    pub fn deduplicate(&mut self, prompt: &mut dyn Prompt) -> Result<usize, CleanerError> {
        if !self.attached {
            return Err(CleanerError::NothingToDeduplicate);
        }
        let clusters = cluster(std::mem::take(&mut self.dedupe));
        self.stats.duplicates = clusters.len();
        if !clusters.is_empty() {
            info!("Found {} possible duplicates", clusters.len());
        }
        Ok(resolve_duplicates(&clusters, &mut self.records, prompt)?)
    }

    /// End-of-run report of counters and failed records.
    pub fn summary(&self) -> Summary<'_> {
        Summary {
            stats: &self.stats,
            failures: &self.failures,
        }
    }
}

/// End-of-run report: counters and the records that failed.
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a> {
    pub stats: &'a Stats,
    pub failures: &'a [RecordFailure],
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parsed: {}", self.stats.parsed)?;
        writeln!(f, "Cleaned: {}", self.stats.cleaned)?;
        writeln!(f, "Abbreviated: {}", self.stats.abbreviated)?;
        writeln!(f, "Dupes: {}", self.stats.duplicates)?;
        writeln!(f, "Failed: {}", self.stats.failed)?;
        if self.failures.is_empty() {
            return Ok(());
        }
        writeln!(f, "\nEntries that produced errors:")?;
        for failure in self.failures {
            writeln!(f, "\n* * * * * * * * * * * * * * * *")?;
            for (label, name) in [
                ("ENTRYTYPE", fields::ENTRY_TYPE),
                ("ID", fields::ID),
                ("Title", fields::TITLE),
                ("Journal", fields::JOURNAL),
            ] {
                writeln!(f, "{label}: {}", failure.record.get(name).unwrap_or("-"))?;
            }
        }
        Ok(())
    }
}
