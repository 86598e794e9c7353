//! Tabular ingestion — turns an uploaded CSV or XLSX file into row records.
//!
//! The parser is picked from the declared file name's extension. The first
//! row is the header; each following row becomes one [`Record`] whose keys
//! keep the header's column order. Nothing is persisted.

pub mod delimited;
pub mod error;
pub mod spreadsheet;

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

pub use error::TabularError;

/// One parsed row: column name to cell value, in source column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Xlsx,
}

impl Format {
    /// Pick a format from a file name's extension (case-insensitive).
    pub fn from_filename(name: &str) -> Result<Self, TabularError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some("xlsx") => Ok(Format::Xlsx),
            _ => Err(TabularError::UnsupportedFormat(format!(
                "'{}': only CSV or XLSX files are supported",
                name
            ))),
        }
    }
}

/// Parse an uploaded file into records.
pub fn parse(bytes: &[u8], filename: &str) -> Result<Vec<Record>, TabularError> {
    let format = Format::from_filename(filename)?;
    let records = match format {
        Format::Csv => delimited::parse(bytes)?,
        Format::Xlsx => spreadsheet::parse(bytes)?,
    };
    debug!(
        "parsed {} as {:?}: {} records",
        filename,
        format,
        records.len()
    );
    Ok(records)
}

/// Make header names usable as unique record keys.
///
/// Blank headers become `Unnamed: {index}`; repeated names get `.1`, `.2`, …
/// appended in order of appearance.
pub(crate) fn unique_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut taken = HashSet::new();
    let mut headers = Vec::new();

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut n = 0;
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", base, n);
        }
        taken.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}
