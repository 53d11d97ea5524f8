//! Read-only rollups: attendance summaries, payroll periods and dashboard trends

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{is_working_day, validate_year, working_days, YearMonth};
use crate::error::DomainResult;

// ============================================================================
// Attendance
// ============================================================================

/// A check-in with its optional check-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceSpan {
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

impl AttendanceSpan {
    /// Hours between check-in and check-out; open spans count as zero
    pub fn hours(&self) -> Decimal {
        match self.check_out {
            Some(out) if out > self.check_in => {
                Decimal::from((out - self.check_in).num_seconds()) / Decimal::from(3600)
            }
            _ => Decimal::ZERO,
        }
    }
}

/// Total worked hours rounded to 2 decimals
pub fn total_hours(spans: &[AttendanceSpan]) -> Decimal {
    spans
        .iter()
        .map(AttendanceSpan::hours)
        .sum::<Decimal>()
        .round_dp(2)
}

/// Attendance figures for one employee over one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAttendance {
    pub total_days_present: i32,
    pub total_days_absent: i32,
    pub total_hours: Decimal,
}

/// Distinct working days with at least one check-in
fn present_days(month: YearMonth, spans: &[AttendanceSpan]) -> BTreeSet<NaiveDate> {
    spans
        .iter()
        .map(|s| s.check_in.date_naive())
        .filter(|d| YearMonth::of(*d) == month && is_working_day(*d))
        .collect()
}

pub fn summarize_month(month: YearMonth, spans: &[AttendanceSpan]) -> MonthlyAttendance {
    let present = present_days(month, spans);
    let working = working_days(month);
    let absent = working.iter().filter(|d| !present.contains(d)).count();

    MonthlyAttendance {
        total_days_present: present.len() as i32,
        total_days_absent: absent as i32,
        total_hours: total_hours(spans),
    }
}

/// Working days of the month without a check-in
pub fn absent_days(month: YearMonth, spans: &[AttendanceSpan]) -> Vec<NaiveDate> {
    let present = present_days(month, spans);
    working_days(month)
        .into_iter()
        .filter(|d| !present.contains(d))
        .collect()
}

// ============================================================================
// Payroll periods
// ============================================================================

/// Look-back window for the payroll summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl ReportPeriod {
    /// Unknown values fall back to six months
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            Some("1m") => ReportPeriod::OneMonth,
            Some("3m") => ReportPeriod::ThreeMonths,
            Some("1y") => ReportPeriod::OneYear,
            _ => ReportPeriod::SixMonths,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            ReportPeriod::OneMonth => 1,
            ReportPeriod::ThreeMonths => 3,
            ReportPeriod::SixMonths => 6,
            ReportPeriod::OneYear => 12,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Percent change from `previous` to `current`.
///
/// A zero baseline yields 100 when there is any current value, otherwise 0.
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Up above +10%, down below -10%, neutral in between
pub fn determine_trend(current: Decimal, previous: Decimal) -> Trend {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Trend::Up
        } else {
            Trend::Neutral
        };
    }
    let band = Decimal::new(1, 1);
    if current > previous * (Decimal::ONE + band) {
        Trend::Up
    } else if current < previous * (Decimal::ONE - band) {
        Trend::Down
    } else {
        Trend::Neutral
    }
}

/// Signed percentage with two decimals, e.g. `+12.50%`
pub fn format_change(change: Decimal) -> String {
    let rounded = change.round_dp(2);
    if rounded >= Decimal::ZERO {
        format!("+{:.2}%", rounded)
    } else {
        format!("{:.2}%", rounded)
    }
}

/// Dashboard date filter and the period it is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPeriod {
    Month(YearMonth),
    Year(i32),
    AllTime,
}

impl DashboardPeriod {
    /// Month if both are given, year if only the year is, all time otherwise
    pub fn from_filter(year: Option<i32>, month: Option<u32>) -> DomainResult<Self> {
        match (year, month) {
            (Some(year), Some(month)) => Ok(DashboardPeriod::Month(YearMonth::new(year, month)?)),
            (Some(year), None) => Ok(DashboardPeriod::Year(validate_year(year)?)),
            _ => Ok(DashboardPeriod::AllTime),
        }
    }

    /// Inclusive date bounds, `None` for all time
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            DashboardPeriod::Month(ym) => Some((ym.first_day(), ym.last_day())),
            DashboardPeriod::Year(year) => Some((
                NaiveDate::from_ymd_opt(*year, 1, 1)?,
                NaiveDate::from_ymd_opt(*year, 12, 31)?,
            )),
            DashboardPeriod::AllTime => None,
        }
    }

    /// The period to compare against. All time compares with last month.
    pub fn previous(&self, today: NaiveDate) -> DashboardPeriod {
        match self {
            DashboardPeriod::Month(ym) => DashboardPeriod::Month(ym.previous()),
            DashboardPeriod::Year(year) => DashboardPeriod::Year(year.saturating_sub(1)),
            DashboardPeriod::AllTime => DashboardPeriod::Month(YearMonth::of(today).previous()),
        }
    }

    /// The period used for the growth rate: the filtered one, or this month
    pub fn growth_anchor(&self, today: NaiveDate) -> DashboardPeriod {
        match self {
            DashboardPeriod::AllTime => DashboardPeriod::Month(YearMonth::of(today)),
            other => *other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_span_hours() {
        let span = AttendanceSpan {
            check_in: at(2024, 6, 3, 8, 0),
            check_out: Some(at(2024, 6, 3, 16, 30)),
        };
        assert_eq!(span.hours(), dec("8.5"));

        let open = AttendanceSpan { check_in: at(2024, 6, 3, 8, 0), check_out: None };
        assert_eq!(open.hours(), Decimal::ZERO);
    }

    #[test]
    fn test_sunday_shift_is_not_a_present_day() {
        // 2 June 2024 is a Sunday, 3 June a Monday
        let june = YearMonth::new(2024, 6).unwrap();
        let spans = [
            AttendanceSpan { check_in: at(2024, 6, 2, 9, 0), check_out: Some(at(2024, 6, 2, 13, 0)) },
            AttendanceSpan { check_in: at(2024, 6, 3, 8, 0), check_out: Some(at(2024, 6, 3, 16, 0)) },
        ];

        let summary = summarize_month(june, &spans);
        assert_eq!(summary.total_days_present, 1);
        assert_eq!(
            summary.total_days_present + summary.total_days_absent,
            working_days(june).len() as i32
        );
        assert_eq!(summary.total_hours, dec("12"));
    }

    #[test]
    fn test_total_hours_rounds() {
        let spans = [AttendanceSpan {
            check_in: at(2024, 6, 3, 8, 0),
            check_out: Some(at(2024, 6, 3, 8, 20)),
        }];
        assert_eq!(total_hours(&spans), dec("0.33"));
    }

    #[test]
    fn test_summarize_month_counts_distinct_days() {
        let june = YearMonth::new(2024, 6).unwrap();
        let spans = [
            AttendanceSpan { check_in: at(2024, 6, 3, 8, 0), check_out: Some(at(2024, 6, 3, 12, 0)) },
            AttendanceSpan { check_in: at(2024, 6, 3, 13, 0), check_out: Some(at(2024, 6, 3, 17, 0)) },
            AttendanceSpan { check_in: at(2024, 6, 4, 8, 0), check_out: None },
        ];
        let summary = summarize_month(june, &spans);
        assert_eq!(summary.total_days_present, 2);
        assert_eq!(summary.total_days_absent, 23);
        assert_eq!(summary.total_hours, dec("8"));
    }

    #[test]
    fn test_absent_days_skip_sundays() {
        let june = YearMonth::new(2024, 6).unwrap();
        let absences = absent_days(june, &[]);
        assert_eq!(absences.len(), 25);
        assert!(!absences.contains(&NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()));
    }

    #[test]
    fn test_report_period_parse() {
        assert_eq!(ReportPeriod::parse_or_default(Some("1y")).months(), 12);
        assert_eq!(ReportPeriod::parse_or_default(Some("2w")), ReportPeriod::SixMonths);
        assert_eq!(ReportPeriod::parse_or_default(None), ReportPeriod::SixMonths);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(dec("150"), dec("100")), dec("50"));
        assert_eq!(percentage_change(dec("50"), dec("100")), dec("-50"));
        assert_eq!(percentage_change(dec("10"), Decimal::ZERO), dec("100"));
        assert_eq!(percentage_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_trend_band() {
        assert_eq!(determine_trend(dec("111"), dec("100")), Trend::Up);
        assert_eq!(determine_trend(dec("110"), dec("100")), Trend::Neutral);
        assert_eq!(determine_trend(dec("89"), dec("100")), Trend::Down);
        assert_eq!(determine_trend(dec("5"), Decimal::ZERO), Trend::Up);
        assert_eq!(determine_trend(Decimal::ZERO, Decimal::ZERO), Trend::Neutral);
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(dec("12.5")), "+12.50%");
        assert_eq!(format_change(dec("-3.456")), "-3.46%");
        assert_eq!(format_change(Decimal::ZERO), "+0.00%");
    }

    #[test]
    fn test_dashboard_periods() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let all = DashboardPeriod::from_filter(None, None).unwrap();
        assert_eq!(all.bounds(), None);
        assert_eq!(
            all.previous(today),
            DashboardPeriod::Month(YearMonth { year: 2023, month: 12 })
        );

        let march = DashboardPeriod::from_filter(Some(2024), Some(3)).unwrap();
        assert_eq!(
            march.previous(today),
            DashboardPeriod::Month(YearMonth { year: 2024, month: 2 })
        );
        assert_eq!(
            DashboardPeriod::from_filter(Some(2024), None).unwrap().previous(today),
            DashboardPeriod::Year(2023)
        );
    }

    #[test]
    fn test_dashboard_filter_rejects_unrepresentable_years() {
        assert!(DashboardPeriod::from_filter(Some(i32::MIN), None).is_err());
        assert!(DashboardPeriod::from_filter(Some(300_000), None).is_err());
        assert!(DashboardPeriod::from_filter(Some(2024), Some(13)).is_err());
        assert_eq!(
            DashboardPeriod::Year(i32::MIN).previous(NaiveDate::default()),
            DashboardPeriod::Year(i32::MIN)
        );
    }
}
