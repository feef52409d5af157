//! Continuous price index built from monthly breakpoints
//!
//! The source series is monthly, keyed by the last day of each month.
//! Between two breakpoints the index moves linearly, one equal step per
//! calendar day, so any date inside the covered range has a value without
//! materializing a daily table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BrrError, BrrResult};

/// One observation of the economic index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceIndexPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PriceIndexPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Index lookup for any date inside the series coverage
#[derive(Debug, Clone)]
pub struct InterpolatedIndex {
    points: Vec<PriceIndexPoint>,
}

impl InterpolatedIndex {
    /// Build from an ordered series.
    ///
    /// Requires at least two points with strictly increasing dates and
    /// finite, positive values.
    pub fn build(points: Vec<PriceIndexPoint>) -> BrrResult<Self> {
        if points.len() < 2 {
            return Err(BrrError::InvalidSeries {
                reason: format!("need at least 2 points, got {}", points.len()),
            });
        }
        if let Some(w) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(BrrError::InvalidSeries {
                reason: format!("dates not strictly increasing at {} -> {}", w[0].date, w[1].date),
            });
        }
        if let Some(p) = points.iter().find(|p| !p.value.is_finite() || p.value <= 0.0) {
            return Err(BrrError::InvalidSeries {
                reason: format!("index value {} at {} must be finite and positive", p.value, p.date),
            });
        }
        Ok(Self { points })
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn points(&self) -> &[PriceIndexPoint] {
        &self.points
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.first_date() && date <= self.last_date()
    }

    /// Index value at `date`
    pub fn value_at(&self, date: NaiveDate) -> BrrResult<f64> {
        if !self.covers(date) {
            return Err(BrrError::OutOfRange {
                date,
                first: self.first_date(),
                last: self.last_date(),
            });
        }

        // First breakpoint whose date is >= the query; a shared boundary
        // belongs to the earlier segment, which ends exactly on its source value
        let upper = self.points.partition_point(|p| p.date < date);
        let end = self.points[upper];
        if end.date == date {
            return Ok(end.value);
        }
        let start = self.points[upper - 1];

        let span = (end.date - start.date).num_days();
        let offset = (date - start.date).num_days();
        let step = (end.value - start.value) / span as f64;
        Ok(offset as f64 * step + start.value)
    }

    /// Monetary correction multiplier from `from` to `to`
    pub fn ratio(&self, from: NaiveDate, to: NaiveDate) -> BrrResult<f64> {
        Ok(self.value_at(to)? / self.value_at(from)?)
    }
}
