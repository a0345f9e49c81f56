//! On-disk cache of the journal abbreviation list.
//!
//! The list is downloaded once (feature `fetch`) and kept as a TOML file so
//! later runs start without touching the network. Custom entries typed by the
//! user are merged in and stored along with it.

use crate::error::CacheError;
use crate::AbbreviationTable;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CACHE_FILE_NAME: &str = "journal_abbreviations.toml";

/// Location of a cached [`AbbreviationTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct AbbreviationCache {
    path: PathBuf,
}

impl AbbreviationCache {
    /// A cache stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache dir>/btcleaner/journal_abbreviations.toml`, under the system
    /// temp dir on platforms without a cache directory.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("btcleaner")
            .join(CACHE_FILE_NAME)
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached table; `None` when no cache has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the file cannot be read and
    /// [`CacheError::Corrupt`] if it does not hold a table.
    pub fn load(&self) -> Result<Option<AbbreviationTable>, CacheError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let table = toml::from_str(&text).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Read journal abbreviations from cache");
        Ok(Some(table))
    }

    /// Write `table` to the cache, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Fails if the table cannot be encoded or the file cannot be written.
    pub fn store(&self, table: &AbbreviationTable) -> Result<(), CacheError> {
        let text = toml::to_string(table)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        fs::write(&self.path, text).map_err(|source| self.io_error(source))?;
        info!(path = %self.path.display(), entries = table.len(), "Saved abbreviation cache");
        Ok(())
    }

    /// Delete the cache file. Returns whether there was one.
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be removed.
    pub fn refresh(&self) -> Result<bool, CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// The cached table, or the list at `database` when the cache is missing,
    /// empty or unreadable; `custom` lines are merged on top either way.
    ///
    /// An unreadable cache is deleted before downloading. Nothing is written
    /// here: call [`Self::store`] to persist the result.
    ///
    /// # Errors
    ///
    /// Fails if the list has to be downloaded and cannot be.
    pub fn load_or_fetch<I, S>(&self, database: &str, custom: I) -> Result<AbbreviationTable, CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = match self.load() {
            Ok(Some(table)) if !table.is_empty() => table,
            Ok(_) => fetch(database)?,
            Err(e) => {
                warn!("{e}; fetching a fresh copy");
                self.refresh()?;
                fetch(database)?
            }
        };
        table.extend_custom(custom);
        Ok(table)
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for AbbreviationCache {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

/// Download an abbreviation list of `full name;abbreviation` lines.
///
/// # Errors
///
/// Fails on transport errors, non-success status codes, and lists that hold
/// no usable entry.
#[cfg(feature = "fetch")]
pub fn fetch(url: &str) -> Result<AbbreviationTable, CacheError> {
    info!(url, "Fetching list of common journal abbreviations");
    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(CacheError::Status(status.as_u16()));
    }
    let table = AbbreviationTable::from_lines(response.text()?.lines());
    if table.is_empty() {
        return Err(CacheError::Unavailable(url.to_string()));
    }
    Ok(table)
}

/// Without the `fetch` feature nothing can be downloaded.
///
/// # Errors
///
/// Always returns [`CacheError::Unavailable`].
#[cfg(not(feature = "fetch"))]
pub fn fetch(url: &str) -> Result<AbbreviationTable, CacheError> {
    Err(CacheError::Unavailable(url.to_string()))
}
