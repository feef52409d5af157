//! Calendar helpers shared by the loaders and the movement engine

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{BrrError, BrrResult};

/// Days per year used when converting elapsed time into consumed useful life.
/// The fiscal year is the civil year and every year counts 365 days.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Parse a date written either as `yyyy-mm-dd` or as `dd/mm/yyyy`
pub fn parse_date(value: &str) -> BrrResult<NaiveDate> {
    let trimmed = value.trim();
    // Spreadsheet exports sometimes carry a midnight timestamp
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(|_| BrrError::InvalidDate {
            value: value.to_string(),
        })
}

/// Last calendar day of the given month
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

/// January 1st of the date's year (start of the fiscal year)
pub fn fiscal_year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// December 31st of the given year
pub fn fiscal_year_end(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

/// Same calendar day one year later (Feb 29 falls back to Feb 28)
pub fn add_one_year(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(12)).unwrap_or(date)
}

/// Elapsed years between two dates under the 365-day convention.
/// Negative when `to` precedes `from`.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// `dd-mm-yyyy`, the form used in output file names
pub fn file_stamp(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_both_formats() {
        assert_eq!(parse_date("2023-12-31").unwrap(), d(2023, 12, 31));
        assert_eq!(parse_date("31/12/2023").unwrap(), d(2023, 12, 31));
        assert_eq!(parse_date(" 2023-12-31 00:00:00 ").unwrap(), d(2023, 12, 31));
        assert!(matches!(parse_date("12/31/2023"), Err(BrrError::InvalidDate { .. })));
    }

    #[test]
    fn test_month_ends() {
        assert_eq!(last_day_of_month(2024, 2), Some(d(2024, 2, 29)));
        assert_eq!(last_day_of_month(2023, 2), Some(d(2023, 2, 28)));
        assert_eq!(last_day_of_month(2023, 12), Some(d(2023, 12, 31)));
        assert_eq!(last_day_of_month(2023, 13), None);
    }

    #[test]
    fn test_year_arithmetic() {
        assert_eq!(fiscal_year_start(d(2022, 6, 15)), d(2022, 1, 1));
        assert_eq!(add_one_year(d(2024, 2, 29)), d(2025, 2, 28));
        assert_eq!(add_one_year(d(2023, 12, 31)), d(2024, 12, 31));
        assert!((years_between(d(2021, 1, 1), d(2022, 1, 1)) - 1.0).abs() < 1e-12);
        assert!(years_between(d(2022, 1, 1), d(2021, 1, 1)) < 0.0);
    }
}
