//! Dashboard trend tests
//!
//! - Percent change with a zero baseline
//! - Trend bands of +/-10%
//! - Period selection and the period each one is compared against

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::calendar::YearMonth;
use shared::reporting::{
    determine_trend, format_change, percentage_change, DashboardPeriod, Trend,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_change_from_zero_baseline() {
        assert_eq!(percentage_change(dec("500"), Decimal::ZERO), Decimal::ONE_HUNDRED);
        assert_eq!(percentage_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_change_is_relative_to_previous() {
        assert_eq!(percentage_change(dec("150"), dec("100")), dec("50"));
        assert_eq!(percentage_change(dec("75"), dec("100")), dec("-25"));
    }

    #[test]
    fn test_trend_bands() {
        assert_eq!(determine_trend(dec("111"), dec("100")), Trend::Up);
        assert_eq!(determine_trend(dec("110"), dec("100")), Trend::Neutral);
        assert_eq!(determine_trend(dec("90"), dec("100")), Trend::Neutral);
        assert_eq!(determine_trend(dec("89"), dec("100")), Trend::Down);
    }

    #[test]
    fn test_change_formatting() {
        assert_eq!(format_change(dec("12.5")), "+12.50%");
        assert_eq!(format_change(dec("-3")), "-3.00%");
        assert_eq!(format_change(Decimal::ZERO), "+0.00%");
    }

    #[test]
    fn test_period_from_filter() {
        assert_eq!(
            DashboardPeriod::from_filter(Some(2024), Some(3)).unwrap(),
            DashboardPeriod::Month(YearMonth::new(2024, 3).unwrap())
        );
        assert_eq!(
            DashboardPeriod::from_filter(Some(2024), None).unwrap(),
            DashboardPeriod::Year(2024)
        );
        assert_eq!(
            DashboardPeriod::from_filter(None, Some(3)).unwrap(),
            DashboardPeriod::AllTime
        );
    }

    #[test]
    fn test_january_compares_with_december() {
        let january = DashboardPeriod::from_filter(Some(2024), Some(1)).unwrap();
        assert_eq!(
            january.previous(date(2024, 6, 15)),
            DashboardPeriod::Month(YearMonth::new(2023, 12).unwrap())
        );
    }

    #[test]
    fn test_all_time_compares_with_last_month() {
        let today = date(2024, 6, 15);
        assert_eq!(
            DashboardPeriod::AllTime.previous(today),
            DashboardPeriod::Month(YearMonth::new(2024, 5).unwrap())
        );
        assert_eq!(
            DashboardPeriod::AllTime.growth_anchor(today),
            DashboardPeriod::Month(YearMonth::new(2024, 6).unwrap())
        );
        assert_eq!(DashboardPeriod::AllTime.bounds(), None);
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(
            DashboardPeriod::Year(2024).bounds(),
            Some((date(2024, 1, 1), date(2024, 12, 31)))
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Growth is positive exactly when sales went up
        #[test]
        fn prop_change_sign_matches_direction(
            current in amount_strategy(),
            previous in amount_strategy()
        ) {
            let change = percentage_change(current, previous);
            if previous.is_zero() {
                prop_assert!(change == Decimal::ZERO || change == Decimal::ONE_HUNDRED);
            } else if current > previous {
                prop_assert!(change >= Decimal::ZERO);
            } else if current < previous {
                prop_assert!(change <= Decimal::ZERO);
            } else {
                prop_assert_eq!(change, Decimal::ZERO);
            }
        }

        /// Equal figures are always neutral
        #[test]
        fn prop_flat_is_neutral(amount in amount_strategy()) {
            prop_assert_eq!(determine_trend(amount, amount), Trend::Neutral);
        }

        /// A month's bounds cover exactly that month
        #[test]
        fn prop_month_bounds(year in 2000i32..2100, month in 1u32..=12) {
            let ym = YearMonth::new(year, month).unwrap();
            let (first, last) = DashboardPeriod::Month(ym).bounds().unwrap();
            prop_assert_eq!(YearMonth::of(first), ym);
            prop_assert_eq!(YearMonth::of(last), ym);
            prop_assert_eq!(YearMonth::of(last.succ_opt().unwrap()), ym.next());
        }

        /// Any accepted year filter has real bounds, so it never reads as all time
        #[test]
        fn prop_year_filter_has_bounds(year in any::<i32>()) {
            match DashboardPeriod::from_filter(Some(year), None) {
                Ok(period) => {
                    prop_assert!(period.bounds().is_some());
                    prop_assert!(period.previous(date(2024, 6, 15)).bounds().is_some());
                }
                Err(_) => prop_assert!(!(1900..=9999).contains(&year)),
            }
        }
    }
}
