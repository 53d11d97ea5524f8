//! Line pricing and totals for sales, orders and invoices

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// One requested line of a sale or order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Quantity and the product prices captured at the time of the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub purchase_price: Decimal,
    /// Percent, 0-100
    pub tax_rate: Decimal,
}

impl PricedLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn tax(&self) -> Decimal {
        self.subtotal() * self.tax_rate / Decimal::ONE_HUNDRED
    }

    pub fn profit(&self) -> Decimal {
        (self.unit_price - self.purchase_price) * Decimal::from(self.quantity)
    }
}

/// Monetary header of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub profit: Decimal,
}

/// Sum priced lines into a header. Amounts are rounded to cents once, at the end.
pub fn compose_totals(lines: &[PricedLine]) -> TransactionTotals {
    let (subtotal, tax, profit) = lines.iter().fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(subtotal, tax, profit), line| {
            (
                subtotal + line.subtotal(),
                tax + line.tax(),
                profit + line.profit(),
            )
        },
    );

    let subtotal = subtotal.round_dp(2);
    let tax = tax.round_dp(2);
    TransactionTotals {
        subtotal,
        tax,
        total: subtotal + tax,
        profit: profit.round_dp(2),
    }
}

/// Validate and normalize requested lines.
///
/// Duplicate products are merged and the result is ordered by product id,
/// which is also the order rows get locked in.
pub fn normalize_lines(lines: &[LineRequest]) -> DomainResult<Vec<LineRequest>> {
    if lines.is_empty() {
        return Err(DomainError::InvalidInput(
            "At least one item is required".to_string(),
        ));
    }

    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::InvalidInput(
                "Item quantity must be positive".to_string(),
            ));
        }
        let entry = merged.entry(line.product_id).or_insert(0);
        *entry = entry.checked_add(line.quantity).ok_or_else(|| {
            DomainError::InvalidInput("Item quantity is too large".to_string())
        })?;
    }

    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| LineRequest {
            product_id,
            quantity,
        })
        .collect())
}

/// Check a requested quantity against what is on the shelf
pub fn ensure_available(requested: i32, available: i32) -> DomainResult<()> {
    if requested > available {
        return Err(DomainError::InsufficientStock {
            requested,
            available,
        });
    }
    Ok(())
}

/// Check a return against the quantity sold minus what was already returned
pub fn ensure_returnable(requested: i32, sold: i32, already_returned: i32) -> DomainResult<()> {
    if requested <= 0 {
        return Err(DomainError::InvalidInput(
            "Return quantity must be positive".to_string(),
        ));
    }
    let returnable = (sold - already_returned).max(0);
    if requested > returnable {
        return Err(DomainError::ReturnExceedsSale {
            requested,
            returnable,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(price: &str, cost: &str, qty: i32, rate: &str) -> PricedLine {
        PricedLine {
            quantity: qty,
            unit_price: dec(price),
            purchase_price: dec(cost),
            tax_rate: dec(rate),
        }
    }

    #[test]
    fn test_two_line_order_with_flat_tax() {
        let totals = compose_totals(&[line("100", "60", 2, "16"), line("50", "30", 1, "16")]);
        assert_eq!(totals.subtotal, dec("250"));
        assert_eq!(totals.tax, dec("40"));
        assert_eq!(totals.total, dec("290"));
        assert_eq!(totals.profit, dec("100"));
    }

    #[test]
    fn test_per_line_tax_rates() {
        let totals = compose_totals(&[line("100", "50", 1, "16"), line("100", "50", 1, "0")]);
        assert_eq!(totals.tax, dec("16"));
        assert_eq!(totals.total, dec("216"));
    }

    #[test]
    fn test_empty_totals_are_zero() {
        assert_eq!(compose_totals(&[]), TransactionTotals::default());
    }

    #[test]
    fn test_normalize_merges_duplicates() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let lines = normalize_lines(&[
            LineRequest { product_id: id, quantity: 2 },
            LineRequest { product_id: other, quantity: 1 },
            LineRequest { product_id: id, quantity: 3 },
        ])
        .unwrap();

        assert_eq!(lines.len(), 2);
        let merged = lines.iter().find(|l| l.product_id == id).unwrap();
        assert_eq!(merged.quantity, 5);
        assert!(lines[0].product_id < lines[1].product_id);
    }

    #[test]
    fn test_normalize_rejects_empty_and_non_positive() {
        assert!(normalize_lines(&[]).is_err());
        let bad = LineRequest { product_id: Uuid::new_v4(), quantity: 0 };
        assert!(normalize_lines(&[bad]).is_err());
    }

    #[test]
    fn test_ensure_available() {
        assert!(ensure_available(3, 12).is_ok());
        assert!(ensure_available(12, 12).is_ok());
        assert_eq!(
            ensure_available(2, 1),
            Err(DomainError::InsufficientStock { requested: 2, available: 1 })
        );
    }

    #[test]
    fn test_ensure_returnable() {
        assert!(ensure_returnable(2, 5, 3).is_ok());
        assert_eq!(
            ensure_returnable(3, 5, 3),
            Err(DomainError::ReturnExceedsSale { requested: 3, returnable: 2 })
        );
        assert!(ensure_returnable(0, 5, 0).is_err());
    }
}
