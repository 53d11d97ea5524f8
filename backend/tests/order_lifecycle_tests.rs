//! Order lifecycle tests
//!
//! PENDING -> IN_PROGRESS -> COMPLETED, cancellation before completion,
//! which states hold stock, and which may be deleted or invoiced.

use proptest::prelude::*;
use shared::{DomainError, OrderStatus};

const ALL: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::InProgress,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
];

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let status = OrderStatus::Pending
            .transition(OrderStatus::InProgress)
            .and_then(|s| s.transition(OrderStatus::Completed))
            .unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert!(status.is_invoiceable());
    }

    #[test]
    fn test_exactly_four_edges() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(edges, 4);
    }

    #[test]
    fn test_completed_order_cannot_be_cancelled() {
        assert_eq!(
            OrderStatus::Completed.transition(OrderStatus::Cancelled),
            Err(DomainError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Cancelled,
            })
        );
    }

    #[test]
    fn test_pending_cannot_skip_to_completed() {
        assert!(OrderStatus::Pending
            .transition(OrderStatus::Completed)
            .is_err());
    }

    #[test]
    fn test_deletable_states() {
        assert!(OrderStatus::Pending.is_deletable());
        assert!(OrderStatus::Cancelled.is_deletable());
        assert!(!OrderStatus::InProgress.is_deletable());
        assert!(!OrderStatus::Completed.is_deletable());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal states accept no transition at all
        #[test]
        fn prop_terminal_states_are_final(next in status_strategy()) {
            prop_assert!(!OrderStatus::Completed.can_transition_to(next));
            prop_assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }

        /// A random walk of requested transitions never leaves the state machine
        #[test]
        fn prop_random_walk_stays_valid(
            requests in prop::collection::vec(status_strategy(), 0..20)
        ) {
            let mut status = OrderStatus::Pending;
            let mut released_stock = false;

            for next in requests {
                match status.transition(next) {
                    Ok(new_status) => {
                        // Stock goes back to the shelf exactly when leaving a holding state for cancel
                        if status.holds_stock() && new_status == OrderStatus::Cancelled {
                            prop_assert!(!released_stock);
                            released_stock = true;
                        }
                        status = new_status;
                    }
                    Err(DomainError::InvalidTransition { from, to }) => {
                        prop_assert_eq!(from, status);
                        prop_assert_eq!(to, next);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            }

            prop_assert_eq!(released_stock, status == OrderStatus::Cancelled);
        }

        /// Only stock-holding states can still be cancelled
        #[test]
        fn prop_cancellable_iff_holding_stock(status in status_strategy()) {
            prop_assert_eq!(
                status.can_transition_to(OrderStatus::Cancelled),
                status.holds_stock()
            );
        }

        /// Only completed orders can be invoiced
        #[test]
        fn prop_invoiceable_iff_completed(status in status_strategy()) {
            prop_assert_eq!(status.is_invoiceable(), status == OrderStatus::Completed);
        }
    }
}
