//! Validation of untyped JSON request bodies into `NewRecord` / `RecordPatch`.
//!
//! Bodies are taken as raw JSON so that every shape problem (missing field,
//! wrong type, unknown key) surfaces as a `Validation` error with a message
//! naming the field, instead of a framework-level deserialization rejection.

use super::types::{NewRecord, RecordPatch, check_fatalities, check_year, parse_year};
use super::{Month, Result, StoreError};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Fields a caller may supply on create or update.
pub const RECORD_FIELDS: [&str; 3] = ["year", "month", "fatalities"];

pub fn parse_new_record(body: &JsonValue) -> Result<NewRecord> {
    let object = as_object(body)?;
    reject_unknown_fields(object)?;

    let missing: Vec<&str> = RECORD_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(NewRecord {
        year: year_field(&object["year"])?,
        month: month_field(&object["month"])?,
        fatalities: fatalities_field(&object["fatalities"])?,
    })
}

pub fn parse_record_patch(body: &JsonValue) -> Result<RecordPatch> {
    let object = as_object(body)?;
    reject_unknown_fields(object)?;

    let patch = RecordPatch {
        year: object.get("year").map(year_field).transpose()?,
        month: object.get("month").map(month_field).transpose()?,
        fatalities: object.get("fatalities").map(fatalities_field).transpose()?,
    };

    if !patch.has_changes() {
        return Err(StoreError::validation(
            "at least one of year, month, fatalities must be provided",
        ));
    }
    Ok(patch)
}

fn as_object(body: &JsonValue) -> Result<&JsonMap<String, JsonValue>> {
    body.as_object()
        .ok_or_else(|| StoreError::validation("request body must be a JSON object"))
}

fn reject_unknown_fields(object: &JsonMap<String, JsonValue>) -> Result<()> {
    if object.contains_key("id") {
        return Err(StoreError::validation(
            "id is assigned by the store and cannot be supplied",
        ));
    }
    let mut unknown: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| !RECORD_FIELDS.contains(key))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(StoreError::validation(format!(
        "unknown fields: {}",
        unknown.join(", ")
    )))
}

fn year_field(value: &JsonValue) -> Result<i32> {
    match value {
        JsonValue::Number(number) => {
            let year = number
                .as_i64()
                .and_then(|year| i32::try_from(year).ok())
                .ok_or_else(|| {
                    StoreError::validation(format!("year must be an integer, got {}", number))
                })?;
            check_year(year)
        }
        JsonValue::String(raw) => parse_year(raw),
        other => Err(StoreError::validation(format!(
            "year must be an integer or a string of digits, got {}",
            other
        ))),
    }
}

fn month_field(value: &JsonValue) -> Result<Month> {
    match value {
        JsonValue::String(raw) => raw.parse(),
        other => Err(StoreError::validation(format!(
            "month must be a month name, got {}",
            other
        ))),
    }
}

fn fatalities_field(value: &JsonValue) -> Result<u64> {
    let fatalities = value.as_u64().ok_or_else(|| {
        StoreError::validation(format!(
            "fatalities must be a non-negative integer, got {}",
            value
        ))
    })?;
    check_fatalities(fatalities)
}
