//! XLSX parsing via calamine. Reads the first worksheet; cells keep their
//! spreadsheet type.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde_json::Value;

use crate::error::TabularError;
use crate::{unique_headers, Record};

// Whole floats below 2^53 are exact in f64 and become JSON integers.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub fn parse(bytes: &[u8]) -> Result<Vec<Record>, TabularError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| TabularError::Parse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TabularError::Parse("workbook has no worksheets".into()))?
        .map_err(|e| TabularError::Parse(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers = unique_headers(header_row.iter().map(|cell| cell.to_string()));

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let mut record = Record::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            record.insert(name.clone(), cell_value(cell));
        }
        records.push(record);
    }

    Ok(records)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => Value::from(*f as i64),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
