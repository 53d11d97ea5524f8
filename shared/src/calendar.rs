//! Calendar helpers for attendance and payroll reporting
//!
//! A working day is any day except Sunday. Every report uses this one
//! definition.

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Earliest year a report may ask for
pub const MIN_REPORT_YEAR: i32 = 1900;
/// Latest year a report may ask for
pub const MAX_REPORT_YEAR: i32 = 9999;

/// Check a requested year is within the reportable range
pub fn validate_year(year: i32) -> DomainResult<i32> {
    if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
        return Err(DomainError::InvalidInput(format!(
            "Year must be between {} and {}, got {}",
            MIN_REPORT_YEAR, MAX_REPORT_YEAR, year
        )));
    }
    Ok(year)
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidInput(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM`
    pub fn parse(s: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidInput(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year.saturating_add(1), month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year.saturating_sub(1), month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |d| *d <= last)
    }

    /// `YYYY-MM`
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn is_working_day(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun
}

pub fn working_days(month: YearMonth) -> Vec<NaiveDate> {
    month.days().filter(|d| is_working_day(*d)).collect()
}

/// The `count` months ending with `last`, oldest first
pub fn trailing_months(last: YearMonth, count: u32) -> Vec<YearMonth> {
    let mut months = Vec::with_capacity(count as usize);
    let mut current = last;
    for _ in 0..count {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

/// Same day `months` earlier, clamped to the end of shorter months
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.days().count(), 29);

        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(dec.next(), YearMonth { year: 2024, month: 1 });
    }

    #[test]
    fn test_working_days_exclude_sundays() {
        // June 2024 starts on a Saturday and has 5 Sundays
        let june = YearMonth::new(2024, 6).unwrap();
        let days = working_days(june);
        assert_eq!(days.len(), 25);
        assert!(days.iter().all(|d| d.weekday() != Weekday::Sun));
        // Saturdays are working days
        assert!(days.contains(&NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[test]
    fn test_parse_year_month() {
        assert_eq!(YearMonth::parse("2024-03").unwrap(), YearMonth { year: 2024, month: 3 });
        assert!(YearMonth::parse("2024-13").is_err());
        assert!(YearMonth::parse("march").is_err());
        assert_eq!(YearMonth::new(2024, 3).unwrap().label(), "2024-03");
    }

    #[test]
    fn test_out_of_range_years_are_rejected() {
        assert!(YearMonth::new(i32::MIN, 1).is_err());
        assert!(YearMonth::new(300_000, 6).is_err());
        assert!(YearMonth::parse("0000-01").is_err());
        assert!(YearMonth::new(MIN_REPORT_YEAR, 1).is_ok());
        assert!(YearMonth::new(MAX_REPORT_YEAR, 12).is_ok());
    }

    #[test]
    fn test_stepping_never_overflows() {
        let first = YearMonth { year: i32::MIN, month: 1 };
        assert_eq!(first.previous().year, i32::MIN);
        let last = YearMonth { year: i32::MAX, month: 12 };
        assert_eq!(last.next().year, i32::MAX);
    }

    #[test]
    fn test_trailing_months_crosses_year() {
        let months = trailing_months(YearMonth { year: 2024, month: 2 }, 3);
        assert_eq!(
            months,
            vec![
                YearMonth { year: 2023, month: 12 },
                YearMonth { year: 2024, month: 1 },
                YearMonth { year: 2024, month: 2 },
            ]
        );
    }

    #[test]
    fn test_months_before_clamps() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(months_before(date, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
