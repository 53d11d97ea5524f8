//! Employee, payroll and vacation rules

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "employee_department", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    Sales,
    Finance,
    HumanResources,
    Operations,
    Warehouse,
    Administration,
    It,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payroll_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    #[default]
    Pending,
    Paid,
}

/// Status of a vacation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Default yearly vacation allowance in days
pub const DEFAULT_VACATION_DAYS: i32 = 22;

/// Net pay: base + bonuses - deductions
pub fn net_salary(base_salary: Decimal, bonuses: Decimal, deductions: Decimal) -> Decimal {
    base_salary + bonuses - deductions
}

/// Validate the money fields of a payroll entry
pub fn validate_payroll_amounts(
    base_salary: Decimal,
    bonuses: Decimal,
    deductions: Decimal,
) -> DomainResult<()> {
    if base_salary <= Decimal::ZERO {
        return Err(DomainError::InvalidInput(
            "Base salary must be positive".to_string(),
        ));
    }
    if bonuses < Decimal::ZERO || deductions < Decimal::ZERO {
        return Err(DomainError::InvalidInput(
            "Bonuses and deductions cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Number of vacation days in an inclusive date range
pub fn vacation_days(start: NaiveDate, end: NaiveDate) -> DomainResult<i32> {
    if end < start {
        return Err(DomainError::InvalidInput(
            "End date must not be before start date".to_string(),
        ));
    }
    let days = (end - start).num_days() + 1;
    i32::try_from(days)
        .map_err(|_| DomainError::InvalidInput("Vacation period is too long".to_string()))
}

/// Whole years of service completed on `today`
pub fn years_of_service(start_date: NaiveDate, today: NaiveDate) -> i32 {
    if today < start_date {
        return 0;
    }
    let mut years = today.year() - start_date.year();
    if (today.month(), today.day()) < (start_date.month(), start_date.day()) {
        years -= 1;
    }
    years
}

/// Check a vacation request against service time and remaining balance
pub fn check_vacation_request(
    employee_start: Option<NaiveDate>,
    days_left: i32,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> DomainResult<i32> {
    let start_date = employee_start.ok_or_else(|| {
        DomainError::InvalidInput("Employee has no start date on record".to_string())
    })?;
    if years_of_service(start_date, today) < 1 {
        return Err(DomainError::InvalidInput(
            "Employee needs at least one year of service to request vacation".to_string(),
        ));
    }

    let days = vacation_days(start, end)?;
    if days > days_left {
        return Err(DomainError::InvalidInput(format!(
            "Requested {} days but only {} vacation days left",
            days, days_left
        )));
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_net_salary() {
        let net = net_salary(
            Decimal::from_str("25000").unwrap(),
            Decimal::from_str("1500.50").unwrap(),
            Decimal::from_str("2000").unwrap(),
        );
        assert_eq!(net, Decimal::from_str("24500.50").unwrap());
    }

    #[test]
    fn test_payroll_amounts() {
        assert!(validate_payroll_amounts(Decimal::ONE, Decimal::ZERO, Decimal::ZERO).is_ok());
        assert!(validate_payroll_amounts(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO).is_err());
        assert!(
            validate_payroll_amounts(Decimal::ONE, Decimal::NEGATIVE_ONE, Decimal::ZERO).is_err()
        );
    }

    #[test]
    fn test_vacation_days_inclusive() {
        assert_eq!(vacation_days(date(2024, 3, 1), date(2024, 3, 1)), Ok(1));
        assert_eq!(vacation_days(date(2024, 2, 27), date(2024, 3, 1)), Ok(4));
        assert!(vacation_days(date(2024, 3, 2), date(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_years_of_service() {
        assert_eq!(years_of_service(date(2020, 6, 15), date(2021, 6, 14)), 0);
        assert_eq!(years_of_service(date(2020, 6, 15), date(2021, 6, 15)), 1);
        assert_eq!(years_of_service(date(2020, 6, 15), date(2019, 1, 1)), 0);
    }

    #[test]
    fn test_vacation_request_rules() {
        let today = date(2024, 5, 1);
        assert_eq!(
            check_vacation_request(Some(date(2022, 1, 1)), 10, date(2024, 6, 1), date(2024, 6, 5), today),
            Ok(5)
        );
        // Too new
        assert!(check_vacation_request(Some(date(2023, 12, 1)), 10, date(2024, 6, 1), date(2024, 6, 5), today).is_err());
        // Not enough balance
        assert!(check_vacation_request(Some(date(2020, 1, 1)), 3, date(2024, 6, 1), date(2024, 6, 5), today).is_err());
        assert!(check_vacation_request(None, 30, date(2024, 6, 1), date(2024, 6, 5), today).is_err());
    }
}
