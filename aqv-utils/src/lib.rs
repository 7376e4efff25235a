//! Shared utility functions for AQV crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, NaiveDate};

    /// Days per month for the dashboard calendar. February is always 28 days;
    /// leap days are not modeled.
    pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    /// Number of days in the modeled calendar year.
    pub const DAYS_IN_YEAR: usize = 365;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a dataset date cell.
    ///
    /// Daily exports use "YYYY-MM-DD", some older exports use "YYYY/MM/DD"
    /// or a trailing time component ("YYYY-MM-DD 00:00:00").
    pub fn parse_dataset_date(s: &str) -> Result<NaiveDate, DateError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DateError("empty date cell".to_string()));
        }
        let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
            .map_err(|e| DateError(format!("{trimmed}: {e}")))
    }

    /// Length of `month` (1-12) in the modeled calendar.
    /// Months outside 1-12 are clamped into range.
    pub fn days_in_month(month: u32) -> u32 {
        DAYS_IN_MONTH[(month.clamp(1, 12) - 1) as usize]
    }

    /// Zero-based day-of-year offset for (month, day), without any dataset
    /// truncation. Month is clamped to 1-12 and day to 1..=days_in_month.
    ///
    /// Jan 1 = 0, Feb 1 = 31, Dec 31 = 364.
    pub fn day_of_year(month: u32, day: u32) -> usize {
        let month = month.clamp(1, 12);
        let day = day.clamp(1, days_in_month(month));
        let before: u32 = DAYS_IN_MONTH[..(month - 1) as usize].iter().sum();
        (before + day - 1) as usize
    }

    /// Zero-based month index (0 = January) of a date.
    pub fn month_index(date: &NaiveDate) -> usize {
        date.month0() as usize
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
