//! Pretty diagnostic reporting using [ariadne].
//!
//! Renders a [`ParseError`] with the offending part of the `.bib` file
//! underlined. Only compiled with the `diagnostics` feature:
//!
//! ```toml
//! [dependencies]
//! btcleaner = { version = "0.1", features = ["diagnostics"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use btcleaner::BibTexParser;
//!
//! let source = "@article{smith2020,\n  title = {Unclosed\n";
//! match BibTexParser::new().parse(source) {
//!     Ok(bibliography) => println!("Parsed {} records", bibliography.records.len()),
//!     Err(e) => eprintln!("{}", e.to_diagnostic("refs.bib", source)),
//! }
//! ```

use crate::error::ParseError;
use crate::{BibTexParser, Bibliography};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;

impl ParseError {
    /// Render this error as an Ariadne report.
    ///
    /// The returned `String` contains ANSI colour codes.
    ///
    /// * `filename` – Label shown in the report header (e.g. `"refs.bib"`).
    /// * `source`   – The text that was parsed.
    pub fn to_diagnostic(&self, filename: &str, source: &str) -> String {
        let range = self.primary_byte_range(source);
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(self.error.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    /// Explicit span, else the whole reported line, else the file start.
    fn primary_byte_range(&self, source: &str) -> Range<usize> {
        if let Some(span) = &self.span {
            return span.start.min(source.len())..span.end.min(source.len());
        }
        if let Some(line) = self.line {
            let index = line.saturating_sub(1);
            let start: usize = source.split_inclusive('\n').take(index).map(str::len).sum();
            let len = source.lines().nth(index).map_or(0, str::len);
            return start..start + len;
        }
        0..0
    }
}

/// Parse BibTeX text, rendering any failure as an Ariadne diagnostic.
///
/// # Errors
///
/// Returns the rendered report when `input` cannot be parsed.
pub fn parse_with_diagnostics(input: &str, filename: &str) -> Result<Bibliography, String> {
    BibTexParser::new()
        .parse(input)
        .map_err(|e| e.to_diagnostic(filename, input))
}
