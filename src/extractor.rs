//! Date-prefix extraction from a line-oriented source log.
//!
//! Matching is a plain string prefix test: a line belongs to a date when it starts
//! with the `YYYY-MM-DD` text, no timestamp parsing involved. Every call opens the
//! source afresh, so extraction is restartable and never caches file contents.
//!
//! These functions block on file I/O and are meant to run on a blocking worker.

use crate::error::{Error, ExtractionError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::LazyLock;

// literal pattern, exercised by the tests below
#[allow(clippy::unwrap_used)]
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

/// Check that `date` has the `YYYY-MM-DD` shape
///
/// This is the synchronous submission check; it does not verify that the date
/// exists on the calendar (see [`parse_calendar_date`]).
pub fn validate_date_format(date: &str) -> Result<()> {
    if DATE_SHAPE.is_match(date) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "date '{date}' must match YYYY-MM-DD"
        )))
    }
}

/// Parse `date` as an ISO calendar date
pub fn parse_calendar_date(date: &str) -> std::result::Result<NaiveDate, ExtractionError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .filter(|_| DATE_SHAPE.is_match(date))
        .ok_or_else(|| ExtractionError::InvalidDate {
            date: date.to_string(),
        })
}

/// Lazy iterator over the source lines starting with a prefix
pub struct MatchingLines {
    lines: Lines<BufReader<File>>,
    prefix: String,
}

impl Iterator for MatchingLines {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match line {
                Ok(line) if line.starts_with(&self.prefix) => return Some(Ok(line)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Open `source` and iterate the lines that start with `prefix`
///
/// Fails with [`ExtractionError::SourceNotFound`] if the file does not exist.
pub fn matching_lines(source: &Path, prefix: &str) -> Result<MatchingLines> {
    let file = File::open(source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::Extraction(ExtractionError::SourceNotFound {
            path: source.to_path_buf(),
        }),
        _ => Error::Io(e),
    })?;

    Ok(MatchingLines {
        lines: BufReader::new(file).lines(),
        prefix: prefix.to_string(),
    })
}

/// Collect every line of `source` that starts with `prefix`, in file order
///
/// An empty result is not an error; deciding what to do with it is up to the
/// caller.
pub fn extract(source: &Path, prefix: &str) -> Result<Vec<String>> {
    matching_lines(source, prefix)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(Error::Io)
}
