//! CSV parsing. Every non-empty cell is kept as a string; empty cells are null.
//! Rows shorter than the header are padded with null; longer rows are an error.

use serde_json::Value;

use crate::error::TabularError;
use crate::{unique_headers, Record};

pub fn parse(bytes: &[u8]) -> Result<Vec<Record>, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers = reader
        .headers()
        .map_err(|e| TabularError::Parse(e.to_string()))?
        .clone();
    if raw_headers.is_empty() {
        return Err(TabularError::Parse("no columns to parse from file".into()));
    }
    let headers = unique_headers(raw_headers.iter().map(str::to_string));

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| TabularError::Parse(e.to_string()))?;
        if row.len() > headers.len() {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(TabularError::Parse(format!(
                "expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                row.len()
            )));
        }
        let mut record = Record::new();
        for (i, name) in headers.iter().enumerate() {
            let value = match row.get(i) {
                Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                _ => Value::Null,
            };
            record.insert(name.clone(), value);
        }
        records.push(record);
    }

    Ok(records)
}
