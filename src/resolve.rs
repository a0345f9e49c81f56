//! Interactive resolution of fuzzy journal matches.
//!
//! Confident matches are accepted silently. Everything else is put to the
//! user exactly once per distinct journal string; the answer is remembered
//! in a [`History`] owned by the caller for the rest of the run.

use crate::error::PromptError;
use crate::matcher::JournalMatch;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Default confidence above which a match is accepted without asking.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.95;

/// Interactive collaborator that asks the user a question.
pub trait Prompt {
    /// Show `text` and return the user's answer.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Cancelled`] when the user interrupts the prompt.
    fn ask(&mut self, text: &str) -> Result<String, PromptError>;
}

/// Outcome of resolving one journal string.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Use the matcher's candidate.
    Accept(String),
    /// Use text the user typed instead.
    Override(String),
    /// Leave the journal as it is.
    Decline,
}

impl Decision {
    /// The replacement journal string, if the decision provides one.
    pub fn replacement(&self) -> Option<&str> {
        match self {
            Decision::Accept(value) | Decision::Override(value) => Some(value),
            Decision::Decline => None,
        }
    }
}

/// Decisions taken so far in a run, keyed by the exact journal string.
#[derive(Debug, Clone, Default)]
pub struct History {
    decisions: HashMap<String, Decision>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decision remembered for `journal`.
    pub fn get(&self, journal: &str) -> Option<&Decision> {
        self.decisions.get(journal)
    }

    /// Number of journals decided so far.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Whether no journal has been decided yet.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    fn remember(&mut self, journal: &str, decision: &Decision) {
        self.decisions.insert(journal.to_string(), decision.clone());
    }
}

/// Turns a fuzzy match into a [`Decision`].
#[derive(Debug, Clone)]
pub struct Resolver {
    accept_threshold: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a resolver with [`DEFAULT_ACCEPT_THRESHOLD`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }

    /// Use a different auto-accept threshold.
    #[must_use]
    pub fn with_threshold(mut self, accept_threshold: f64) -> Self {
        self.accept_threshold = accept_threshold;
        self
    }

    /// Scores above this value are accepted without asking.
    pub fn threshold(&self) -> f64 {
        self.accept_threshold
    }

    /// Decide what to do with `journal` given its best match.
    ///
    /// 1. A journal already in `history` gets its stored decision back, no prompt.
    /// 2. A score strictly above the threshold is accepted, no prompt.
    /// 3. Otherwise the user is asked once: `y`/`yes` accepts the candidate,
    ///    `n`/`no`/empty declines, anything else is taken verbatim as the
    ///    abbreviation to use.
    ///
    /// Every decision, declines included, is stored in `history`.
    ///
    /// # Errors
    ///
    /// Propagates the prompt's error; the history is left untouched then.
    pub fn resolve(
        &self,
        prompt: &mut dyn Prompt,
        history: &mut History,
        journal: &str,
        found: &JournalMatch,
    ) -> Result<Decision, PromptError> {
        if let Some(decision) = history.get(journal) {
            debug!(journal, ?decision, "Reusing earlier decision");
            return Ok(decision.clone());
        }

        let decision = if found.score > self.accept_threshold {
            Decision::Accept(found.candidate.clone())
        } else {
            let answer = prompt.ask(&format!(
                "({:.1}%) Replace \"{}\" with \"{}\" or something else? ",
                found.score * 100.0,
                journal,
                found.candidate
            ))?;
            interpret_answer(answer.trim(), &found.candidate)
        };

        history.remember(journal, &decision);
        Ok(decision)
    }
}

fn interpret_answer(answer: &str, candidate: &str) -> Decision {
    match answer.to_lowercase().as_str() {
        "y" | "yes" => Decision::Accept(candidate.to_string()),
        "n" | "no" | "" => Decision::Decline,
        _ => Decision::Override(answer.to_string()),
    }
}

/// A [`Prompt`] that replays canned answers.
///
/// Every question asked is recorded. Once the script is exhausted each
/// further question is answered with an empty string, which declines a
/// journal suggestion and keeps every member of a duplicate cluster; this
/// makes the default value suitable for unattended runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Result<String, PromptError>>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    /// Script the given answers, in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| Ok(a.into())).collect(),
            asked: Vec::new(),
        }
    }

    /// Queue an error as the next answer.
    #[must_use]
    pub fn then_fail(mut self, error: PromptError) -> Self {
        self.answers.push_back(Err(error));
        self
    }

    /// Every prompt text shown so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, text: &str) -> Result<String, PromptError> {
        self.asked.push(text.to_string());
        self.answers.pop_front().unwrap_or_else(|| Ok(String::new()))
    }
}
