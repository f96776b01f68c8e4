//! Balanced panel scaffolds.
//!
//! Merging a scaffold first forces one row for every platform and ISO week
//! in the requested years, whether or not any metric family observed it.

use chrono::{NaiveDate, Weekday};
use std::ops::RangeInclusive;

use super::schema::{Cell, PanelTable};
use crate::utils::config::{PLATFORM_COLUMN, WEEK_COLUMN, YEAR_COLUMN};

/// Number of ISO weeks (52 or 53) in an ISO year
pub fn iso_weeks_in_year(year: i32) -> u32 {
    if NaiveDate::from_isoywd_opt(year, 53, Weekday::Mon).is_some() {
        53
    } else {
        52
    }
}

/// Key-only table with every `(platform, year, week)` combination
pub fn balanced_scaffold(platforms: &[&str], years: RangeInclusive<i32>) -> PanelTable {
    let mut table = PanelTable::new(
        "scaffold",
        vec![
            PLATFORM_COLUMN.to_string(),
            YEAR_COLUMN.to_string(),
            WEEK_COLUMN.to_string(),
        ],
    );

    for platform in platforms {
        for year in years.clone() {
            for week in 1..=iso_weeks_in_year(year) {
                table.push_row(vec![
                    Cell::from(*platform),
                    Cell::Number(year as f64),
                    Cell::Number(week as f64),
                ]);
            }
        }
    }

    table
}
