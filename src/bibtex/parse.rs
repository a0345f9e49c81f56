//! BibTeX parsing implementation.
//!
//! Reading is done by [`biblatex`]; this module turns its entries into
//! [`Record`]s and its errors into [`ParseError`]s.

use crate::bibtex::Bibliography;
use crate::error::{ParseError, SourceSpan, ValueError};
use crate::regex::Regex;
use crate::utils::newline_delimiter_of;
use crate::Record;
use biblatex::{Chunk, Entry};
use std::sync::LazyLock;
use tracing::debug;

use super::latex::escape_specials;

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\r?\n\s*").unwrap());

/// Fields whose content is taken literally, without LaTeX decoding.
const VERBATIM_FIELDS: [&str; 7] = ["doi", "eprint", "file", "pdf", "uri", "url", "verba"];

/// Parse the content of a BibTeX file.
pub(crate) fn bibtex_parse(text: &str) -> Result<Bibliography, ParseError> {
    let parsed = biblatex::Bibliography::parse(text).map_err(|e| parse_error(text, &e))?;
    let records: Vec<Record> = parsed.into_iter().map(entry_to_record).collect();
    debug!(records = records.len(), "Parsed BibTeX input");
    Ok(Bibliography {
        records,
        newline: newline_delimiter_of(text),
    })
}

fn entry_to_record(entry: Entry) -> Record {
    let mut record = Record::new(entry.entry_type.to_string().to_lowercase(), entry.key);

    let mut fields: Vec<_> = entry.fields.into_iter().collect();
    fields.sort_by_key(|(_, chunks)| chunks.first().map_or(usize::MAX, |c| c.span.start));

    for (name, chunks) in fields {
        let name = name.to_lowercase();
        let verbatim = VERBATIM_FIELDS.contains(&name.as_str());
        let mut value = String::new();
        for chunk in &chunks {
            match &chunk.v {
                Chunk::Normal(s) if verbatim => value.push_str(s),
                Chunk::Verbatim(s) if verbatim => value.push_str(s),
                Chunk::Math(s) if verbatim => value.push_str(s),
                Chunk::Normal(s) => value.push_str(&escape_specials(s)),
                Chunk::Verbatim(s) => {
                    value.push('{');
                    value.push_str(s);
                    value.push('}');
                }
                Chunk::Math(s) => {
                    value.push('$');
                    value.push_str(s);
                    value.push('$');
                }
            }
        }
        record.set(&name, LINE_BREAK_REGEX.replace_all(value.trim(), " "));
    }
    record
}

/// Position the error at the line its span starts on.
fn parse_error(text: &str, error: &biblatex::ParseError) -> ParseError {
    let start = error.span.start.min(text.len());
    let end = error.span.end.clamp(start, text.len());
    let line = text[..start].matches('\n').count() + 1;
    ParseError::at_line(line, ValueError::Syntax(error.to_string()))
        .with_span(SourceSpan::new(start, end))
}
