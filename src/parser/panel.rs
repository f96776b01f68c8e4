//! Weekly panel parsing.
//!
//! A panel file is either a JSON array of flat objects, one per row, or a
//! serialized `PanelTable` (`columns`/`rows`, as written by `decentra metrics`).
//! For row objects, columns are the union of all keys in first-seen order and
//! a key absent from a row is read as `Missing`, the same as an explicit `null`.

use crate::merge::{Cell, PanelTable};
use crate::utils::error::ParseError;
use log::debug;
use serde_json::{Map, Value};

/// Parse a panel, tagging it with `source`
///
/// **Public** - main entry point for panel parsing
///
/// # Errors
/// * `ParseError::InvalidFormat` - Input is neither form, or a cell holds a
///   nested array/object
/// * `ParseError::JsonError` - A table object does not match `PanelTable`
pub fn parse_panel(raw: &Value, source: &str) -> Result<PanelTable, ParseError> {
    if raw.is_object() {
        let mut table: PanelTable = serde_json::from_value(raw.clone())?;
        debug!(
            "Parsed panel table '{}' (stored as '{}'): {} rows",
            source,
            table.source,
            table.rows.len()
        );
        table.source = source.to_string();
        return Ok(table);
    }

    let records = raw.as_array().ok_or_else(|| {
        ParseError::InvalidFormat(format!("Panel '{}' must be a JSON array of objects", source))
    })?;

    let objects = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record.as_object().ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Panel '{}' record {} is not a JSON object",
                    source, index
                ))
            })
        })
        .collect::<Result<Vec<&Map<String, Value>>, _>>()?;

    let mut columns: Vec<String> = Vec::new();
    for obj in &objects {
        for name in obj.keys() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }

    let mut table = PanelTable::new(source, columns);
    for (index, obj) in objects.iter().enumerate() {
        let row = table
            .columns
            .iter()
            .map(|name| match obj.get(name) {
                Some(value) => to_cell(value).ok_or_else(|| {
                    ParseError::InvalidFormat(format!(
                        "Panel '{}' record {} column '{}': nested values are not supported",
                        source, index, name
                    ))
                }),
                None => Ok(Cell::Missing),
            })
            .collect::<Result<Vec<Cell>, _>>()?;
        table.push_row(row);
    }

    debug!(
        "Parsed panel '{}': {} columns, {} rows",
        source,
        table.columns.len(),
        table.rows.len()
    );

    Ok(table)
}

fn to_cell(value: &Value) -> Option<Cell> {
    match value {
        Value::Null => Some(Cell::Missing),
        Value::Bool(b) => Some(Cell::Text(b.to_string())),
        Value::Number(n) => n.as_f64().map(Cell::Number),
        Value::String(s) => Some(Cell::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}
