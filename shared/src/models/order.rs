//! Order lifecycle

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Order status
///
/// `Pending -> InProgress -> Completed`, with cancellation allowed until
/// the order is completed. Only completed orders can be invoiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::InProgress, OrderStatus::Cancelled)
        )
    }

    pub fn transition(self, next: OrderStatus) -> DomainResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_invoiceable(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Stock reserved by the order goes back to the shelf when it leaves this state
    pub fn holds_stock(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::InProgress)
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidInput(format!(
                "Unknown order status: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = OrderStatus::Pending
            .transition(OrderStatus::InProgress)
            .and_then(|s| s.transition(OrderStatus::Completed))
            .unwrap();
        assert!(status.is_invoiceable());
    }

    #[test]
    fn test_cannot_skip_processing() {
        assert!(OrderStatus::Pending
            .transition(OrderStatus::Completed)
            .is_err());
    }

    #[test]
    fn test_completed_is_terminal() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::InProgress,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_only_completed_is_invoiceable() {
        assert!(!OrderStatus::Pending.is_invoiceable());
        assert!(!OrderStatus::InProgress.is_invoiceable());
        assert!(!OrderStatus::Cancelled.is_invoiceable());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("in_progress".parse::<OrderStatus>(), Ok(OrderStatus::InProgress));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
