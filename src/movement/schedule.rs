//! Evaluation checkpoints of a movement

use chrono::{Datelike, NaiveDate};

use crate::dates::fiscal_year_end;

/// Fiscal year ends from the first immobilization year up to the year
/// before the horizon, followed by the horizon date itself.
///
/// Always yields at least the horizon. When the first immobilization lies
/// after the horizon year no year end is produced.
pub fn schedule(first_immobilization: NaiveDate, horizon: NaiveDate) -> Vec<NaiveDate> {
    let mut checkpoints: Vec<NaiveDate> = (first_immobilization.year()..horizon.year())
        .filter_map(fiscal_year_end)
        .collect();
    checkpoints.push(horizon);
    checkpoints
}
