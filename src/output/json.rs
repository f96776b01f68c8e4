//! JSON readers and writers.
//!
//! Every output is pretty-printed; parent directories are created on demand.

use super::validate_path;
use crate::merge::{PanelTable, UnifiedPanel};
use crate::parser::{parse_events, parse_panel, RawEvent};
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write any serializable value to a JSON file
///
/// **Public** - used for metric rows, summaries and merge reports
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing JSON to: {}", output_path.display());

    validate_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, value).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Wrote {} bytes to {}",
        calculate_file_size(output_path),
        output_path.display()
    );

    Ok(())
}

/// Write a unified panel as an array of flat row objects
///
/// Missing cells become `null`, so a reader can tell them apart from zero.
/// Flat records carry no column kinds: read back and merged again, every
/// column is a measure. Use `write_panel_table` to keep count columns.
pub fn write_panel(panel: &UnifiedPanel, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(&panel.to_records(), output_path)
}

/// Write a unified panel in `PanelTable` form, keeping its count columns
pub fn write_panel_table(
    panel: &UnifiedPanel,
    source: &str,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    write_json(&panel.to_table(source), output_path)
}

/// Read a raw event list
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - Not valid JSON
/// * `OutputError::ParseFailed` - Valid JSON, but not a valid event list
pub fn read_events(input_path: impl AsRef<Path>) -> Result<Vec<RawEvent>, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading events from: {}", input_path.display());

    let raw = read_value(input_path)?;
    Ok(parse_events(&raw)?)
}

/// Read a weekly panel, tagging it with `source`
pub fn read_panel(input_path: impl AsRef<Path>, source: &str) -> Result<PanelTable, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading panel '{}' from: {}", source, input_path.display());

    let raw = read_value(input_path)?;
    Ok(parse_panel(&raw, source)?)
}

fn read_value(input_path: &Path) -> Result<Value, OutputError> {
    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
