//! Raw event parsing.
//!
//! Collectors hand us JSON arrays of objects. Field names differ between the
//! chain-explorer and Git-hosting clients, so each field is resolved from a
//! list of accepted names (see `utils::config`).

use super::schema::RawEvent;
use crate::utils::config::{
    DATETIME_FORMATS, DATE_FORMATS, PARTICIPANT_FIELD_NAMES, PLATFORM_FIELD_NAMES,
    TIMESTAMP_FIELD_NAMES,
};
use crate::utils::error::ParseError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde_json::{Map, Value};

/// Parse a JSON array of event objects
///
/// **Public** - main entry point for event parsing
///
/// # Errors
/// * `ParseError::InvalidFormat` - Input is not an array of objects
/// * `ParseError::MissingField` - A record has none of the accepted names for a field
/// * `ParseError::InvalidTimestamp` - A timestamp matches no accepted layout
pub fn parse_events(raw: &Value) -> Result<Vec<RawEvent>, ParseError> {
    let records = raw.as_array().ok_or_else(|| {
        ParseError::InvalidFormat("Events must be a JSON array of objects".to_string())
    })?;

    let events = records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_event(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} raw events", events.len());

    Ok(events)
}

/// Parse a single event object
pub fn parse_event(index: usize, record: &Value) -> Result<RawEvent, ParseError> {
    let obj = record.as_object().ok_or_else(|| {
        ParseError::InvalidFormat(format!("Record {} is not a JSON object", index))
    })?;

    let platform = extract_text(obj, PLATFORM_FIELD_NAMES, index)?;
    let participant = extract_text(obj, PARTICIPANT_FIELD_NAMES, index)?;
    let raw_timestamp = extract_text(obj, TIMESTAMP_FIELD_NAMES, index)?;

    let timestamp = parse_timestamp(&raw_timestamp).ok_or(ParseError::InvalidTimestamp {
        index,
        value: raw_timestamp,
    })?;

    Ok(RawEvent {
        platform,
        timestamp,
        participant,
    })
}

/// Parse a timestamp in any of the layouts collectors emit
///
/// Tries RFC 3339 first (normalized to UTC), then the naive datetime
/// layouts, then date-only layouts (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Look up the first present field among `names`, rendered as text
///
/// Numbers are accepted (some miner identities are numeric pool ids).
/// A field that is present but `null` reads as an empty string, so the
/// aggregator can skip and count the record; only a field absent under
/// every accepted name is an error.
fn extract_text(obj: &Map<String, Value>, names: &[&str], index: usize) -> Result<String, ParseError> {
    let mut seen_null = false;

    for name in names {
        match obj.get(*name) {
            Some(Value::String(s)) => return Ok(s.clone()),
            Some(Value::Number(n)) => return Ok(n.to_string()),
            Some(Value::Null) => seen_null = true,
            _ => continue,
        }
    }

    if seen_null {
        return Ok(String::new());
    }

    Err(ParseError::MissingField {
        index,
        tried: names.join("|"),
    })
}
