//! Input validation helpers for the back office

use rust_decimal::Decimal;

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("Invalid email format"),
    }
}

/// Minimum length accepted at registration
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

/// Rules for a changed password: upper, lower and a digit
pub fn validate_strong_password(password: &str) -> Result<(), &'static str> {
    validate_password(password)?;
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err("Password must contain upper and lower case letters and a number");
    }
    Ok(())
}

/// NUIT tax number: exactly 9 digits
pub fn validate_nuit(nuit: &str) -> Result<(), &'static str> {
    if nuit.len() == 9 && nuit.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("NUIT must have exactly 9 digits")
    }
}

/// Tax rates are percentages between 0 and 100
pub fn validate_tax_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err("Tax rate must be between 0 and 100");
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

pub fn validate_month(month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12");
    }
    Ok(())
}

/// Payroll years start at 2020
pub fn validate_payroll_year(year: i32) -> Result<(), &'static str> {
    if year < 2020 {
        return Err("Year must be 2020 or later");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cashier@shop.co.mz").is_ok());
        assert!(validate_email("@shop.com").is_err());
        assert!(validate_email("cashier@localhost").is_err());
        assert!(validate_email("cashier").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("abcdef").is_ok());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_validate_strong_password() {
        assert!(validate_strong_password("Secret1").is_ok());
        assert!(validate_strong_password("secret1").is_err());
        assert!(validate_strong_password("SECRET1").is_err());
        assert!(validate_strong_password("Secrets").is_err());
        assert!(validate_strong_password("Se1").is_err());
    }

    #[test]
    fn test_validate_nuit() {
        assert!(validate_nuit("123456789").is_ok());
        assert!(validate_nuit("12345678").is_err());
        assert!(validate_nuit("12345678A").is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(Decimal::ZERO).is_ok());
        assert!(validate_tax_rate(Decimal::from_str("16").unwrap()).is_ok());
        assert!(validate_tax_rate(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_tax_rate(Decimal::from_str("100.01").unwrap()).is_err());
        assert!(validate_tax_rate(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_month_and_year() {
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_payroll_year(2020).is_ok());
        assert!(validate_payroll_year(2019).is_err());
    }
}
