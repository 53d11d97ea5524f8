//! Attendance, payroll and vacation aggregation tests
//!
//! - Working days are every day except Sunday
//! - Present plus absent days cover the working days of the month
//! - Worked hours ignore open check-ins
//! - Net salary, payroll periods and vacation eligibility

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::calendar::{working_days, YearMonth};
use shared::reporting::{absent_days, summarize_month, total_hours, AttendanceSpan, ReportPeriod};
use shared::{check_vacation_request, net_salary, validate_payroll_amounts, vacation_days};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn shift(day: NaiveDate, start_hour: u32, hours: i64) -> AttendanceSpan {
    let check_in: DateTime<Utc> = Utc.from_utc_datetime(&day.and_hms_opt(start_hour, 0, 0).unwrap());
    AttendanceSpan {
        check_in,
        check_out: Some(check_in + Duration::hours(hours)),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_march_2024_working_days() {
        // 31 days, Sundays on the 3rd, 10th, 17th, 24th and 31st
        let month = YearMonth::new(2024, 3).unwrap();
        assert_eq!(working_days(month).len(), 26);
    }

    #[test]
    fn test_month_summary() {
        let month = YearMonth::new(2024, 3).unwrap();
        let spans = vec![
            shift(date(2024, 3, 1), 8, 8),
            shift(date(2024, 3, 2), 8, 4),
            AttendanceSpan {
                check_in: Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(),
                check_out: None,
            },
        ];

        let summary = summarize_month(month, &spans);
        assert_eq!(summary.total_days_present, 3);
        assert_eq!(summary.total_days_absent, 23);
        assert_eq!(summary.total_hours, dec("12.00"));
        assert_eq!(absent_days(month, &spans).len(), 23);
    }

    #[test]
    fn test_half_hour_rounding() {
        let check_in = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let spans = vec![AttendanceSpan {
            check_in,
            check_out: Some(check_in + Duration::minutes(450)),
        }];
        assert_eq!(total_hours(&spans), dec("7.50"));
    }

    #[test]
    fn test_net_salary() {
        assert_eq!(
            net_salary(dec("25000.00"), dec("1500.00"), dec("2750.50")),
            dec("23749.50")
        );
    }

    #[test]
    fn test_payroll_amount_rules() {
        assert!(validate_payroll_amounts(dec("1000"), Decimal::ZERO, Decimal::ZERO).is_ok());
        assert!(validate_payroll_amounts(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(validate_payroll_amounts(dec("1000"), dec("-1"), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_summary_period_defaults_to_six_months() {
        assert_eq!(ReportPeriod::parse_or_default(Some("1y")).months(), 12);
        assert_eq!(ReportPeriod::parse_or_default(Some("2w")).months(), 6);
        assert_eq!(ReportPeriod::parse_or_default(None).months(), 6);
    }

    #[test]
    fn test_vacation_needs_a_year_of_service() {
        let today = date(2024, 6, 1);
        let result = check_vacation_request(
            Some(date(2023, 9, 1)),
            22,
            date(2024, 7, 1),
            date(2024, 7, 5),
            today,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_vacation_balance() {
        let today = date(2024, 6, 1);
        let start = Some(date(2020, 1, 15));
        assert_eq!(
            check_vacation_request(start, 10, date(2024, 7, 1), date(2024, 7, 10), today),
            Ok(10)
        );
        assert!(check_vacation_request(start, 9, date(2024, 7, 1), date(2024, 7, 10), today).is_err());
    }

    #[test]
    fn test_vacation_end_before_start() {
        assert!(vacation_days(date(2024, 7, 10), date(2024, 7, 1)).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn month_strategy() -> impl Strategy<Value = YearMonth> {
        (2020i32..=2030, 1u32..=12).prop_map(|(y, m)| YearMonth::new(y, m).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// No working day is a Sunday and every non-Sunday is a working day
        #[test]
        fn prop_working_days_exclude_only_sundays(month in month_strategy()) {
            let days = working_days(month);
            let in_month = month.last_day().day() as usize;
            let sundays = (1..=month.last_day().day())
                .filter(|d| date(month.year, month.month, *d).weekday() == Weekday::Sun)
                .count();

            prop_assert!(days.iter().all(|d| d.weekday() != Weekday::Sun));
            prop_assert_eq!(days.len(), in_month - sundays);
        }

        /// Present + absent = working days, even with Sunday shifts
        #[test]
        fn prop_present_plus_absent_is_working_days(
            month in month_strategy(),
            picks in prop::collection::vec(0usize..31, 0..40)
        ) {
            let working = working_days(month);
            let all_days: Vec<NaiveDate> = month.days().collect();
            let spans: Vec<AttendanceSpan> = picks
                .iter()
                .map(|i| shift(all_days[i % all_days.len()], 9, 8))
                .collect();

            let summary = summarize_month(month, &spans);
            prop_assert_eq!(
                (summary.total_days_present + summary.total_days_absent) as usize,
                working.len()
            );
            prop_assert_eq!(absent_days(month, &spans).len() as i32, summary.total_days_absent);
        }

        /// Hours are the sum of closed shifts
        #[test]
        fn prop_hours_sum_closed_shifts(hours in prop::collection::vec(1i64..12, 0..20)) {
            let day = date(2024, 5, 6);
            let spans: Vec<AttendanceSpan> = hours.iter().map(|h| shift(day, 0, *h)).collect();
            let expected: i64 = hours.iter().sum();
            prop_assert_eq!(total_hours(&spans), Decimal::from(expected));
        }

        /// Net salary never exceeds base plus bonuses
        #[test]
        fn prop_net_salary_bounds(
            base in 1i64..10_000_000,
            bonuses in 0i64..1_000_000,
            deductions in 0i64..1_000_000
        ) {
            let (base, bonuses, deductions) = (
                Decimal::new(base, 2),
                Decimal::new(bonuses, 2),
                Decimal::new(deductions, 2),
            );
            let net = net_salary(base, bonuses, deductions);
            prop_assert!(net <= base + bonuses);
            prop_assert_eq!(net + deductions, base + bonuses);
        }

        /// Vacation day counts are inclusive of both ends
        #[test]
        fn prop_vacation_days_inclusive(offset in 0i64..60, length in 0i64..30) {
            let start = date(2024, 1, 1) + Duration::days(offset);
            let end = start + Duration::days(length);
            prop_assert_eq!(vacation_days(start, end).unwrap() as i64, length + 1);
        }
    }
}
