//! Conversion of spreadsheet rows into ServiceDesk ticket payloads.
//!
//! Cells holding [`NOT_ASSIGNED`] are treated as deliberately empty and never
//! reach the payload. Custom (`udf_`) columns are grouped under
//! [`UDF_FIELDS_KEY`].

use chrono::{Local, NaiveDateTime, TimeZone};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::domain::record::{IMPORT_DATE_FORMAT, Record};
use crate::domain::ticket::TicketPayload;

pub const NOT_ASSIGNED: &str = "Not Assigned";
pub const UDF_FIELDS_KEY: &str = "udf_fields";
pub const UDF_PREFIX: &str = "udf_";
pub const UDF_PICKLIST_PREFIX: &str = "udf_pick_";
pub const COMPLETED_TIME_UDF: &str = "udf_sline_301";
pub const RESOLVED_TIME_UDF: &str = "udf_sline_302";

const TEXT_COLUMNS: &[(&str, &str)] = &[("Subject", "subject"), ("Description", "description")];

const LOOKUP_COLUMNS: &[(&str, &str)] = &[
    ("Requester", "requester"),
    ("Site", "site"),
    ("Account", "account"),
    ("Item", "item"),
    ("Request Type", "request_type"),
    ("Level", "level"),
    ("Urgency", "urgency"),
    ("Impact", "impact"),
    ("Technician", "technician"),
    ("Category", "category"),
    ("Subcategory", "subcategory"),
    ("Priority", "priority"),
    ("Group", "group"),
    ("Status", "status"),
    ("Template", "template"),
];

const RESOLUTION_COLUMN: (&str, &str) = ("Resolution", "resolution");
const CREATED_TIME_COLUMN: (&str, &str) = ("Created Time", "created_time");
const ELAPSED_TIME_COLUMNS: &[(&str, &str)] = &[
    ("Completed Time", COMPLETED_TIME_UDF),
    ("Resolved Time", RESOLVED_TIME_UDF),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse date '{input}': {reason}")]
pub struct DateParseError {
    pub input: String,
    pub reason: String,
}

/// A mapped row plus anything that had to be dropped along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub payload: TicketPayload,
    pub diagnostics: Vec<String>,
}

/// Parses an import date (`25/12/2023 02:30 PM`) in the local timezone and
/// returns epoch milliseconds as a string.
pub fn parse_date_to_millis(input: &str) -> Result<String, DateParseError> {
    let trimmed = input.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, IMPORT_DATE_FORMAT).map_err(|err| {
        DateParseError {
            input: trimmed.to_string(),
            reason: err.to_string(),
        }
    })?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| DateParseError {
            input: trimmed.to_string(),
            reason: "time does not exist in the local timezone".to_string(),
        })?;
    Ok(local.timestamp_millis().to_string())
}

pub fn is_not_assigned(text: &str) -> bool {
    text.trim() == NOT_ASSIGNED
}

pub fn map_record(record: &Record) -> MappedRecord {
    let mut payload = TicketPayload::new();
    let mut udf = Map::new();
    let mut diagnostics = Vec::new();

    for (column, key) in TEXT_COLUMNS {
        if let Some(text) = assigned_text(record, column) {
            payload.insert(key, Value::String(text));
        }
    }

    for (column, key) in LOOKUP_COLUMNS {
        if let Some(text) = assigned_text(record, column) {
            payload.insert(key, json!({ "name": text }));
        }
    }

    let (column, key) = RESOLUTION_COLUMN;
    if let Some(text) = assigned_text(record, column) {
        payload.insert(key, json!({ "content": text }));
    }

    let (column, key) = CREATED_TIME_COLUMN;
    if let Some(text) = assigned_text(record, column) {
        match parse_date_to_millis(&text) {
            Ok(millis) => payload.insert(key, json!({ "value": millis })),
            Err(err) => diagnostics.push(date_diagnostic(column, &err)),
        }
    }

    for (column, udf_key) in ELAPSED_TIME_COLUMNS {
        if let Some(text) = assigned_text(record, column) {
            match parse_date_to_millis(&text) {
                Ok(millis) => {
                    udf.insert(udf_key.to_string(), Value::String(millis));
                }
                Err(err) => diagnostics.push(date_diagnostic(column, &err)),
            }
        }
    }

    for (column, value) in record.iter() {
        if !column.starts_with(UDF_PREFIX)
            || column == COMPLETED_TIME_UDF
            || column == RESOLVED_TIME_UDF
        {
            continue;
        }
        let Some(text) = value.as_text() else {
            continue;
        };
        if is_not_assigned(&text) {
            continue;
        }
        let value = if column.starts_with(UDF_PICKLIST_PREFIX) {
            json!({ "name": text })
        } else {
            Value::String(text)
        };
        udf.insert(column.to_string(), value);
    }

    if !udf.is_empty() {
        payload.insert(UDF_FIELDS_KEY, Value::Object(udf));
    }

    MappedRecord {
        payload,
        diagnostics,
    }
}

fn assigned_text(record: &Record, column: &str) -> Option<String> {
    record
        .get(column)
        .and_then(|value| value.as_text())
        .filter(|text| !is_not_assigned(text))
}

fn date_diagnostic(column: &str, err: &DateParseError) -> String {
    tracing::warn!(column, "{err}");
    format!("{column}: {err}")
}
