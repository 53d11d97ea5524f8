//! Audit trail tags

use serde::{Deserialize, Serialize};

/// Well-known movement types written by the audit recorder.
/// Manual movements may carry any other tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Sale,
    Order,
    OrderUpdate,
    Invoice,
    Return,
    ReturnReversal,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "SALE",
            MovementType::Order => "ORDER",
            MovementType::OrderUpdate => "ORDER_UPDATE",
            MovementType::Invoice => "INVOICE",
            MovementType::Return => "RETURN",
            MovementType::ReturnReversal => "RETURN_REVERSAL",
            MovementType::CreateProduct => "CREATE_PRODUCT",
            MovementType::UpdateProduct => "UPDATE_PRODUCT",
            MovementType::DeleteProduct => "DELETE_PRODUCT",
        }
    }

    /// Entity type the movement is filed under
    pub fn entity_type(&self) -> &'static str {
        match self {
            MovementType::Sale => "Sale",
            MovementType::Order | MovementType::OrderUpdate => "Order",
            MovementType::Invoice => "Invoice",
            MovementType::Return | MovementType::ReturnReversal => "Return",
            MovementType::CreateProduct
            | MovementType::UpdateProduct
            | MovementType::DeleteProduct => "Product",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
