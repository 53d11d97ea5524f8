//! Notification kinds and low-stock message text

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LowStock => "low_stock",
            NotificationKind::General => "general",
        }
    }
}

pub fn low_stock_title(product_name: &str) -> String {
    format!("Low stock: {}", product_name)
}

pub fn low_stock_message(product_name: &str, quantity: i32) -> String {
    format!(
        "Product {} has only {} units left in stock",
        product_name, quantity
    )
}
