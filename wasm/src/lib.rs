//! WebAssembly bindings for the POS till
//!
//! The browser computes cart totals, product pricing and calendar figures
//! with the same rules the backend applies, so the till can show them
//! before a request is sent.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

pub use shared::calendar::{working_days, YearMonth};
pub use shared::models::*;
pub use shared::reporting::{determine_trend, percentage_change, Trend};
pub use shared::validation::*;

/// Announce the module in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("POS till rules loaded"));
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn to_decimal(value: f64) -> Result<Decimal, JsValue> {
    Decimal::try_from(value).map_err(|e| js_error("Invalid amount", e))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Cart header (subtotal, tax, total, profit) for a JSON array of priced lines
#[wasm_bindgen]
pub fn calculate_cart_totals(lines_json: &str) -> Result<String, JsValue> {
    let lines: Vec<PricedLine> =
        serde_json::from_str(lines_json).map_err(|e| js_error("Invalid cart JSON", e))?;
    if let Some(index) = lines.iter().position(|l| l.quantity < 1) {
        return Err(JsValue::from_str(&format!(
            "Quantity must be at least 1 on line {}",
            index + 1
        )));
    }

    let totals = compose_totals(&lines);
    serde_json::to_string(&totals).map_err(|e| js_error("Failed to encode totals", e))
}

/// Stored prices for a product form: tax-inclusive cost, selling price, profit
#[wasm_bindgen]
pub fn price_product(
    raw_purchase_price: f64,
    selling_price: Option<f64>,
    tax_rate: f64,
) -> Result<String, JsValue> {
    let tax_rate = to_decimal(tax_rate)?;
    validate_tax_rate(tax_rate).map_err(JsValue::from_str)?;
    let selling_price = selling_price.map(to_decimal).transpose()?;

    let pricing = ProductPricing::derive(to_decimal(raw_purchase_price)?, selling_price, tax_rate);
    serde_json::to_string(&pricing).map_err(|e| js_error("Failed to encode pricing", e))
}

#[wasm_bindgen]
pub fn is_low_stock_level(quantity: i32, threshold: i32) -> bool {
    is_low_stock(quantity, threshold)
}

/// Working days (every day but Sunday) in a month
#[wasm_bindgen]
pub fn count_working_days(year: i32, month: u32) -> Result<u32, JsValue> {
    let month = YearMonth::new(year, month).map_err(|e| js_error("Invalid month", e))?;
    Ok(working_days(month).len() as u32)
}

#[wasm_bindgen]
pub fn calculate_percentage_change(current: f64, previous: f64) -> Result<f64, JsValue> {
    Ok(to_f64(percentage_change(
        to_decimal(current)?,
        to_decimal(previous)?,
    )))
}

/// `up`, `down` or `neutral`
#[wasm_bindgen]
pub fn sales_trend(current: f64, previous: f64) -> Result<String, JsValue> {
    let trend = match determine_trend(to_decimal(current)?, to_decimal(previous)?) {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Neutral => "neutral",
    };
    Ok(trend.to_string())
}

/// Whether an order may move from one status to another, e.g. `PENDING` to `CANCELLED`
#[wasm_bindgen]
pub fn can_transition_order(from: &str, to: &str) -> bool {
    let parse = |s: &str| serde_json::from_value::<OrderStatus>(serde_json::Value::from(s)).ok();
    match (parse(from), parse(to)) {
        (Some(from), Some(to)) => from.can_transition_to(to),
        _ => false,
    }
}

/// Inclusive day count of a vacation request; dates are `YYYY-MM-DD`
#[wasm_bindgen]
pub fn vacation_day_count(start: &str, end: &str) -> Result<i32, JsValue> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| js_error("Invalid date", e))
    };
    vacation_days(parse(start)?, parse(end)?).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn is_valid_nuit(nuit: &str) -> bool {
    validate_nuit(nuit).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_totals_apply_line_tax() {
        let lines = r#"[
            {"quantity": 2, "unit_price": "50.00", "purchase_price": "40.00", "tax_rate": "16"}
        ]"#;

        let totals: TransactionTotals =
            serde_json::from_str(&calculate_cart_totals(lines).unwrap()).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(10000, 2));
        assert_eq!(totals.tax, Decimal::new(1600, 2));
        assert_eq!(totals.total, Decimal::new(11600, 2));
        assert_eq!(totals.profit, Decimal::new(2000, 2));
    }

    #[test]
    fn test_empty_cart_is_zero() {
        let totals: TransactionTotals =
            serde_json::from_str(&calculate_cart_totals("[]").unwrap()).unwrap();
        assert_eq!(totals, TransactionTotals::default());
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        assert!(is_low_stock_level(10, 10));
        assert!(is_low_stock_level(0, 10));
        assert!(!is_low_stock_level(11, 10));
    }

    #[test]
    fn test_working_days_skip_sundays() {
        // February 2024 has 29 days, 4 of them Sundays
        assert_eq!(count_working_days(2024, 2).unwrap(), 25);
    }

    #[test]
    fn test_order_transitions() {
        assert!(can_transition_order("PENDING", "IN_PROGRESS"));
        assert!(can_transition_order("IN_PROGRESS", "CANCELLED"));
        assert!(!can_transition_order("COMPLETED", "CANCELLED"));
        assert!(!can_transition_order("pending", "CANCELLED"));
    }

    #[test]
    fn test_vacation_day_count_is_inclusive() {
        assert_eq!(vacation_day_count("2024-03-01", "2024-03-10").unwrap(), 10);
        assert_eq!(vacation_day_count("2024-03-01", "2024-03-01").unwrap(), 1);
    }

    #[test]
    fn test_percentage_change_from_zero() {
        assert_eq!(calculate_percentage_change(50.0, 0.0).unwrap(), 100.0);
        assert_eq!(calculate_percentage_change(0.0, 0.0).unwrap(), 0.0);
        assert_eq!(calculate_percentage_change(150.0, 100.0).unwrap(), 50.0);
    }
}
