//! Readers and writers for the JSON files the CLI works with.
//!
//! This module handles:
//! - Reading raw event lists and weekly panels
//! - Writing metric rows, summaries, reports and unified panels

pub mod json;

// Re-export main functions
pub use json::{read_events, read_panel, write_json, write_panel, write_panel_table};

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
