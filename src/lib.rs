//! Decentralization Panel
//!
//! Weekly decentralization metrics and panel alignment for
//! blockchain platforms.
//!
//! This crate provides the core implementation for the
//! `decentra` CLI tool:
//! - `aggregator` turns raw block/commit events into weekly inverse HHI
//!   and Shannon entropy rows
//! - `merge` aligns independently produced weekly panels on
//!   `(platform, year, week)`
//!
//! ## Getting Started
//!
//! ```bash
//! decentra metrics --input blocks.json --family blocks --panel-output blocks_panel.json
//! decentra merge blocks_panel.json market.json --output merged.json --summary
//! ```

pub mod aggregator;
pub mod commands;
pub mod merge;
pub mod output;
pub mod parser;
pub mod utils;
