use btcleaner::{
    AbbreviationCache, AbbreviationTable, Bibliography, Cleaner, CleanerConfig, CleanerError,
    Prompt, PromptError, Run, ScriptedPrompt,
};

use anyhow::{Context, Result};
use clap::Parser;
use inquire::{Confirm, InquireError, Text};
use std::{
    fs,
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status of a run stopped at a prompt.
const EXIT_CANCELLED: i32 = 130;

/// Crawl through a BibTeX database and replace journal names with their
/// official abbreviations.
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct Cli {
    /// BibTeX file to clean in place.
    #[arg(value_name = "infile")]
    pub infile: PathBuf,

    /// Refresh cached journal list.
    #[arg(short, long)]
    pub refresh: bool,

    /// Database of journal abbreviations.
    #[arg(short, long, value_name = "url")]
    pub database: Option<String>,

    /// Custom abbreviation, e.g. -c 'Journal of Kittens;J. Kitt.'. Can be
    /// given more than once; these are cached.
    #[arg(short, long, value_name = "full;abbr")]
    pub custom: Vec<String>,

    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Never prompt: decline every suggestion, keep every duplicate, and save.
    #[arg(long)]
    pub non_interactive: bool,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = self.load_config()?;

        let backup = backup_path(&self.infile);
        fs::copy(&self.infile, &backup).with_context(|| {
            format!("failed to back up {} to {}", self.infile.display(), backup.display())
        })?;
        info!("Backed up {} to {}", self.infile.display(), backup.display());

        let cache = config
            .cache_file()
            .map_or_else(AbbreviationCache::default, AbbreviationCache::new);
        if self.refresh {
            cache.refresh()?;
        }
        // A custom-only fallback table is never cached, so the next run
        // downloads the full list again.
        let (table, cacheable) = match cache.load_or_fetch(config.database(), config.custom()) {
            Ok(table) => (table, true),
            Err(error) => {
                warn!("{error}; continuing with custom abbreviations only");
                (AbbreviationTable::from_lines(config.custom()), false)
            }
        };
        if cacheable {
            cache.store(&table)?;
        }
        info!("Read {} journals.", table.len());

        let source = fs::read_to_string(&self.infile)
            .with_context(|| format!("failed to read {}", self.infile.display()))?;
        let mut bibliography = parse(&source, &self.infile)?;
        let records = std::mem::take(&mut bibliography.records);

        let mut prompt: Box<dyn Prompt> = if self.non_interactive {
            Box::new(ScriptedPrompt::default())
        } else {
            Box::new(InquirePrompt)
        };

        let cleaner = Cleaner::with_config(table, &config);
        let mut run = Run::new();
        cleaner.process_all(&mut run, records, prompt.as_mut())?;
        run.deduplicate(prompt.as_mut())?;

        let custom = run.custom_abbreviations();
        if cacheable && !custom.is_empty() {
            let mut table = cleaner.matcher().clone();
            table.extend_custom(&custom);
            cache.store(&table)?;
        }

        print!("{}", run.summary());

        if !self.non_interactive && !confirm_save(&self.infile)? {
            info!("Not saving changes.");
            return Ok(());
        }
        bibliography.records = run.into_records();
        fs::write(&self.infile, bibliography.to_bibtex_string())
            .with_context(|| format!("failed to write {}", self.infile.display()))?;
        info!("Saved changes to {}", self.infile.display());
        Ok(())
    }

    /// Config file, then command-line overrides on top.
    fn load_config(&self) -> Result<CleanerConfig> {
        let mut config = match &self.config {
            Some(path) => CleanerConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => CleanerConfig::load_default()?,
        };
        if let Some(url) = &self.database {
            config.set_database(url.clone());
        }
        for line in &self.custom {
            config.add_custom(line.clone());
        }
        Ok(config)
    }
}

/// Terminal prompt. Multi-line questions print everything but their last
/// line before asking.
struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn ask(&mut self, text: &str) -> Result<String, PromptError> {
        let (context, question) = text.trim_end().rsplit_once('\n').unwrap_or(("", text));
        if !context.is_empty() {
            println!("{context}");
        }
        Text::new(question.trim()).prompt().map_err(prompt_error)
    }
}

fn prompt_error(error: InquireError) -> PromptError {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            PromptError::Cancelled
        }
        other => PromptError::Failed(other.to_string()),
    }
}

fn confirm_save(path: &Path) -> Result<bool> {
    Confirm::new(&format!("Save changes to {}?", path.display()))
        .with_default(false)
        .prompt()
        .map_err(|e| CleanerError::from(prompt_error(e)).into())
}

fn parse(source: &str, path: &Path) -> Result<Bibliography> {
    #[cfg(feature = "diagnostics")]
    {
        btcleaner::parse_with_diagnostics(source, &path.display().to_string())
            .map_err(anyhow::Error::msg)
    }
    #[cfg(not(feature = "diagnostics"))]
    {
        btcleaner::BibTexParser::new()
            .parse(source)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<CleanerError>()
        .is_some_and(CleanerError::is_cancelled)
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run() {
        if is_cancelled(&error) {
            error!("Cancelled; nothing was written");
            exit(EXIT_CANCELLED);
        }
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}
