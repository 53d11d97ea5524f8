//! Common types used across the back office

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Inclusive range of calendar days used by report filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> DomainResult<Self> {
        if start_date > end_date {
            return Err(DomainError::InvalidInput(
                "Start date must be before end date".to_string(),
            ));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Half-open UTC instant bounds `[start 00:00, day after end 00:00)`
    pub fn instant_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            start_of_day(self.start_date),
            start_of_day(self.end_date) + Duration::days(1),
        )
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Success flag plus the caller's remaining unread count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub success: bool,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_rejects_inverted() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).is_ok());
        assert!(DateRange::new(a, a).is_ok());
    }

    #[test]
    fn test_instant_bounds_cover_end_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let (start, end) = DateRange::new(day, day).unwrap().instant_bounds();
        assert_eq!((end - start).num_hours(), 24);
    }
}
