//! Product pricing and stock-level rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity at or below which a product counts as low on stock
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Tax rate (percent) applied when neither the product nor the tenant sets one
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 0);

/// Prices derived from the raw purchase cost entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Purchase cost including tax
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
}

impl ProductPricing {
    /// Derive stored prices from a raw purchase cost.
    ///
    /// The purchase price is stored tax-inclusive. When no selling price is
    /// given the product is sold at cost.
    pub fn derive(
        raw_purchase_price: Decimal,
        selling_price: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        let purchase_price = with_tax(raw_purchase_price, tax_rate);
        let selling_price = selling_price.unwrap_or(purchase_price);
        Self {
            purchase_price,
            selling_price,
            profit: selling_price - purchase_price,
        }
    }
}

/// Add a percentage tax to an amount, rounded to cents
pub fn with_tax(amount: Decimal, tax_rate: Decimal) -> Decimal {
    (amount * (Decimal::ONE + tax_rate / Decimal::ONE_HUNDRED)).round_dp(2)
}

/// Low-stock rule; the boundary is inclusive
pub fn is_low_stock(quantity: i32, threshold: i32) -> bool {
    quantity <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_default_tax_rate() {
        assert_eq!(DEFAULT_TAX_RATE, dec("16"));
    }

    #[test]
    fn test_pricing_defaults_selling_to_cost() {
        let pricing = ProductPricing::derive(dec("100"), None, dec("16"));
        assert_eq!(pricing.purchase_price, dec("116.00"));
        assert_eq!(pricing.selling_price, dec("116.00"));
        assert_eq!(pricing.profit, Decimal::ZERO);
    }

    #[test]
    fn test_pricing_with_margin() {
        let pricing = ProductPricing::derive(dec("50"), Some(dec("80")), dec("16"));
        assert_eq!(pricing.purchase_price, dec("58.00"));
        assert_eq!(pricing.profit, dec("22.00"));
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        assert!(is_low_stock(10, 10));
        assert!(is_low_stock(9, 10));
        assert!(!is_low_stock(11, 10));
        assert!(is_low_stock(0, 0));
    }
}
