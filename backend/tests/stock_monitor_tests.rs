//! Stock threshold monitor and movement recorder tests
//!
//! - Which events trigger a low-stock check
//! - The inclusive low-stock boundary
//! - At most one unread low-stock notification per product
//! - Every transaction event maps to one audit movement

use pos_stock_backend::events::{DomainEvent, EventBus, ProductChange, StockLine};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{is_low_stock, MovementType, OrderStatus};
use std::collections::HashSet;
use uuid::Uuid;

fn line(quantity: i32) -> StockLine {
    StockLine {
        product_id: Uuid::new_v4(),
        name: "Arroz 5kg".to_string(),
        quantity,
        unit_price: Decimal::new(45000, 2),
    }
}

/// Unread notifications keyed like the partial unique index
#[derive(Default)]
struct Inbox {
    unread: HashSet<(Uuid, Uuid)>,
}

impl Inbox {
    /// Insert unless an unread one exists; returns whether a row was created
    fn notify_low_stock(&mut self, company_id: Uuid, product_id: Uuid) -> bool {
        self.unread.insert((company_id, product_id))
    }

    fn mark_read(&mut self, company_id: Uuid, product_id: Uuid) {
        self.unread.remove(&(company_id, product_id));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_sale_checks_every_product_sold() {
        let lines = vec![line(1), line(2)];
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let event = DomainEvent::SaleRecorded {
            company_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            total: Decimal::new(135000, 2),
            lines,
        };

        assert_eq!(event.stock_checks(), ids);
        assert_eq!(event.movement().unwrap().movement_type, MovementType::Sale);
    }

    #[test]
    fn test_return_does_not_trigger_check() {
        let event = DomainEvent::ReturnRecorded {
            company_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            return_id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            line: line(1),
        };

        assert!(event.stock_checks().is_empty());
        assert_eq!(event.movement().unwrap().movement_type, MovementType::Return);
    }

    #[test]
    fn test_deleted_product_is_not_checked() {
        let event = DomainEvent::ProductChanged {
            company_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            change: ProductChange::Deleted,
            line: line(4),
        };

        assert!(event.stock_checks().is_empty());
        assert_eq!(
            event.movement().unwrap().movement_type,
            MovementType::DeleteProduct
        );
    }

    #[test]
    fn test_notification_events_are_not_audited() {
        let event = DomainEvent::UnreadCountChanged {
            company_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            unread_count: 0,
        };
        assert!(event.movement().is_none());
        assert!(event.actor_id().is_none());
    }

    #[test]
    fn test_order_movement_is_filed_under_order() {
        let order_id = Uuid::new_v4();
        let event = DomainEvent::OrderCreated {
            company_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            order_id,
            status: OrderStatus::Pending,
            total: Decimal::new(2000, 2),
            lines: vec![line(2)],
        };

        let entry = event.movement().unwrap();
        assert_eq!(entry.entity_id, order_id);
        assert_eq!(entry.movement_type.entity_type(), "Order");
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(is_low_stock(10, 10));
        assert!(!is_low_stock(11, 10));
        assert!(is_low_stock(0, 0));
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let company_id = Uuid::new_v4();

        bus.publish(DomainEvent::UnreadCountChanged {
            company_id,
            user_id: Uuid::new_v4(),
            unread_count: 2,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.company_id(), company_id);
    }

    #[test]
    fn test_read_notification_allows_a_new_one() {
        let mut inbox = Inbox::default();
        let (company, product) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(inbox.notify_low_stock(company, product));
        assert!(!inbox.notify_low_stock(company, product));
        inbox.mark_read(company, product);
        assert!(inbox.notify_low_stock(company, product));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Low stock exactly when quantity is at or below the threshold
        #[test]
        fn prop_low_stock_boundary(quantity in 0i32..1000, threshold in 0i32..1000) {
            prop_assert_eq!(is_low_stock(quantity, threshold), quantity <= threshold);
        }

        /// Repeated low-stock checks leave at most one unread notification per product
        #[test]
        fn prop_single_unread_notification(
            checks in prop::collection::vec((0usize..3, 0i32..30), 1..50),
            threshold in 0i32..20
        ) {
            let company = Uuid::new_v4();
            let products: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
            let mut inbox = Inbox::default();
            let mut created = 0;

            for (i, quantity) in checks {
                if is_low_stock(quantity, threshold) && inbox.notify_low_stock(company, products[i]) {
                    created += 1;
                }
            }

            prop_assert!(inbox.unread.len() <= products.len());
            prop_assert_eq!(created, inbox.unread.len());
        }

        /// Every transaction event carries its actor and yields one movement
        #[test]
        fn prop_sales_are_audited(quantities in prop::collection::vec(1i32..10, 1..6)) {
            let sale_id = Uuid::new_v4();
            let actor = Uuid::new_v4();
            let lines: Vec<StockLine> = quantities.iter().map(|q| line(*q)).collect();
            let event = DomainEvent::SaleRecorded {
                company_id: Uuid::new_v4(),
                actor_id: actor,
                sale_id,
                total: Decimal::ONE,
                lines,
            };

            let entry = event.movement().unwrap();
            prop_assert_eq!(entry.entity_id, sale_id);
            prop_assert_eq!(event.actor_id(), Some(actor));
            prop_assert_eq!(event.stock_checks().len(), quantities.len());
        }
    }
}
