//! Loosely-typed input tables
//!
//! Callers hand the pipeline plain row tables: JSON arrays of objects,
//! newline-delimited JSON, or CSV with a header row. This module reads all
//! three into a [`RawTable`] that remembers which columns were present,
//! since column presence (not per-row values) drives several fallbacks.

use crate::error::AnalysisError;
use serde_json::{Map, Value};
use std::io::Read;

/// One input row keyed by column name
pub type RawRecord = Map<String, Value>;

/// Rows plus the ordered union of their column names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    /// Build from rows, collecting columns in order of first appearance
    pub fn from_records(rows: Vec<RawRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse a JSON array of objects
    pub fn parse_json(json: &str) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Convert an already-parsed JSON array of objects
    pub fn from_json_value(value: Value) -> Result<Self, AnalysisError> {
        let Value::Array(items) = value else {
            return Err(AnalysisError::ParseError(
                "expected a JSON array of row objects".to_string(),
            ));
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(AnalysisError::ParseError(format!(
                        "row {} is not an object: {}",
                        index + 1,
                        other
                    )))
                }
            }
        }
        Ok(Self::from_records(rows))
    }

    /// Parse NDJSON (one row object per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Self, AnalysisError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawRecord>(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(AnalysisError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(Self::from_records(rows))
    }

    /// Parse CSV with a header row; empty cells become nulls
    pub fn parse_csv<R: Read>(reader: R) -> Result<Self, AnalysisError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: RawRecord = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (column.clone(), value)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Parse CSV held in memory
    pub fn parse_csv_str(csv_text: &str) -> Result<Self, AnalysisError> {
        Self::parse_csv(csv_text.as_bytes())
    }
}
