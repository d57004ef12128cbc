//! Adapter from raw input rows to the typed customer and activity tables
//!
//! Column rules:
//! - `customer_id` is required in the customer table and in any non-empty
//!   activity table
//! - event time comes from `timestamp`, else `date`, else the run's "now"
//! - `duration` and `value` are optional; null or empty cells are absent

use crate::error::AnalysisError;
use crate::schema::table::{RawRecord, RawTable};
use crate::types::{ActivityEvent, ActivityTable, Customer, CustomerTable, TimeColumn};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const CUSTOMER_ID: &str = "customer_id";

/// Naive datetime layouts accepted for event times, interpreted as UTC
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-only layouts accepted for event times
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Request body shape: `{"customers": [...], "activities": [...]}`
#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    customers: Value,
    #[serde(default)]
    activities: Option<Value>,
}

/// Adapter for converting raw tables to typed pipeline tables
pub struct TableAdapter;

impl TableAdapter {
    /// Convert a raw customer table
    pub fn customers(raw: &RawTable) -> Result<CustomerTable, AnalysisError> {
        if !raw.columns.is_empty() && !raw.has_column(CUSTOMER_ID) {
            return Err(AnalysisError::missing_column("customers", CUSTOMER_ID));
        }
        if raw.is_empty() {
            return Ok(CustomerTable::default());
        }

        let mut customers = Vec::with_capacity(raw.len());
        for (index, row) in raw.rows.iter().enumerate() {
            match customer_id(row, index)? {
                Some(id) => customers.push(Customer::new(id)),
                None => {
                    return Err(AnalysisError::MissingField(format!(
                        "customers row {}: {CUSTOMER_ID}",
                        index + 1
                    )))
                }
            }
        }
        Ok(CustomerTable::new(customers))
    }

    /// Convert a raw activity table
    pub fn activities(raw: &RawTable) -> Result<ActivityTable, AnalysisError> {
        if raw.is_empty() {
            return Ok(ActivityTable::default());
        }
        if !raw.has_column(CUSTOMER_ID) {
            return Err(AnalysisError::missing_column("activities", CUSTOMER_ID));
        }

        let time_column = if raw.has_column("timestamp") {
            TimeColumn::Timestamp
        } else if raw.has_column("date") {
            TimeColumn::Date
        } else {
            log::debug!("activities: no timestamp or date column, events take the run time");
            TimeColumn::Synthetic
        };

        let mut events = Vec::with_capacity(raw.len());
        for (index, row) in raw.rows.iter().enumerate() {
            let occurred_at = match time_column {
                TimeColumn::Synthetic => None,
                column => row
                    .get(column.as_str())
                    .map(|v| parse_time_cell(v, index))
                    .transpose()?
                    .flatten(),
            };

            events.push(ActivityEvent {
                customer_id: customer_id(row, index)?,
                occurred_at,
                duration: numeric_cell(row, "duration", index)?,
                value: numeric_cell(row, "value", index)?,
            });
        }

        Ok(ActivityTable {
            time_column,
            events,
        })
    }

    /// Parse a combined request body into both tables
    pub fn parse_request(json: &str) -> Result<(CustomerTable, ActivityTable), AnalysisError> {
        let request: AnalysisRequest = serde_json::from_str(json)?;
        let customers = RawTable::from_json_value(request.customers)?;
        let activities = match request.activities {
            Some(Value::Null) | None => RawTable::default(),
            Some(value) => RawTable::from_json_value(value)?,
        };
        Ok((Self::customers(&customers)?, Self::activities(&activities)?))
    }
}

/// Parse an event time string
///
/// Accepts RFC 3339 plus common naive datetime and date layouts; naive
/// values are taken as UTC, dates as midnight.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, AnalysisError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }

    Err(AnalysisError::DateParseError(format!(
        "unrecognized timestamp '{text}'"
    )))
}

fn customer_id(row: &RawRecord, index: usize) -> Result<Option<String>, AnalysisError> {
    match row.get(CUSTOMER_ID) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(AnalysisError::InvalidValue(format!(
            "row {}: {CUSTOMER_ID} must be a string or number, got {other}",
            index + 1
        ))),
    }
}

fn parse_time_cell(value: &Value, index: usize) -> Result<Option<DateTime<Utc>>, AnalysisError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_timestamp(s).map(Some).map_err(|_| {
            AnalysisError::DateParseError(format!(
                "row {}: unrecognized timestamp '{}'",
                index + 1,
                s.trim()
            ))
        }),
        other => Err(AnalysisError::DateParseError(format!(
            "row {}: expected a date string, got {other}",
            index + 1
        ))),
    }
}

fn numeric_cell(row: &RawRecord, column: &str, index: usize) -> Result<Option<f64>, AnalysisError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            AnalysisError::InvalidValue(format!(
                "row {}: {column} '{s}' is not numeric",
                index + 1
            ))
        }),
        Some(other) => Err(AnalysisError::InvalidValue(format!(
            "row {}: {column} must be numeric, got {other}",
            index + 1
        ))),
    }
}
