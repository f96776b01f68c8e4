//! Input parsing and record definitions.
//!
//! This module handles:
//! - Parsing raw JSON event lists from collectors
//! - Parsing JSON panels into `PanelTable`s
//! - Defining the event and weekly row schema

pub mod events;
pub mod panel;
pub mod schema;

// Re-export main types
pub use events::{parse_event, parse_events, parse_timestamp};
pub use panel::parse_panel;
pub use schema::{EventFamily, GroupKey, ParticipantShare, RawEvent, WeeklyMetricRow};
