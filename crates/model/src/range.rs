use std::fmt::{self, Display};

use chrono::{Datelike as _, Duration, NaiveDate};
use thiserror::Error;

/// Date format used by the portal query string and the CLI.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid date '{0}', expected DD-MM-YYYY")]
    InvalidDate(String),
    #[error("Start date {start} is after end date {end}")]
    Reversed { start: String, end: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<DateRange, RangeError> {
        if start > end {
            return Err(RangeError::Reversed {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<DateRange, RangeError> {
        DateRange::new(parse_date(start)?, parse_date(end)?)
    }

    /// First to last day of the month before `today`.
    pub fn previous_month(today: NaiveDate) -> DateRange {
        let first_of_month = today - Duration::days(today.day0() as i64);
        let end = first_of_month - Duration::days(1);
        let start = end - Duration::days(end.day0() as i64);
        DateRange { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_param(), self.end_param())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| RangeError::InvalidDate(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_previous_month() {
        let range = DateRange::previous_month(date(2026, 3, 15));
        assert_eq!(date(2026, 2, 1), range.start());
        assert_eq!(date(2026, 2, 28), range.end());
    }

    #[test]
    fn test_previous_month_in_january() {
        let range = DateRange::previous_month(date(2026, 1, 1));
        assert_eq!(date(2025, 12, 1), range.start());
        assert_eq!(date(2025, 12, 31), range.end());
    }

    #[test]
    fn test_previous_month_leap_year() {
        let range = DateRange::previous_month(date(2024, 3, 31));
        assert_eq!(date(2024, 2, 29), range.end());
    }

    #[test]
    fn test_parse() {
        let range = DateRange::parse("01-09-2026", "30-09-2026").unwrap();
        assert_eq!("01-09-2026", range.start_param());
        assert_eq!("30-09-2026", range.end_param());
        assert_eq!("01-09-2026 - 30-09-2026", range.to_string());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Err(RangeError::InvalidDate("2026-09-01".to_owned())),
            DateRange::parse("2026-09-01", "30-09-2026")
        );
        assert!(matches!(
            DateRange::parse("30-09-2026", "01-09-2026"),
            Err(RangeError::Reversed { .. })
        ));
    }
}
