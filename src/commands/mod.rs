//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod merge;
pub mod metrics;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use merge::{execute_merge, validate_merge_args};
pub use metrics::{execute_metrics, validate_metrics_args};
pub use models::{MergeArgs, MetricsArgs};
pub use utils::{display_schema, display_version};
