//! Domain events published after a transaction commits
//!
//! Services publish on the [`EventBus`] once their database transaction has
//! committed. Subscribers (the movement recorder, the stock monitor and the
//! realtime gateway) each hold their own receiver, so a slow or failing
//! subscriber can never block or roll back the request that caused the event.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use shared::{MovementType, OrderStatus};

/// A product line as it appears in an event payload
#[derive(Debug, Clone, Serialize)]
pub struct StockLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductChange {
    Created,
    Restocked,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    SaleRecorded {
        company_id: Uuid,
        actor_id: Uuid,
        sale_id: Uuid,
        total: Decimal,
        lines: Vec<StockLine>,
    },
    OrderCreated {
        company_id: Uuid,
        actor_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        total: Decimal,
        lines: Vec<StockLine>,
    },
    OrderUpdated {
        company_id: Uuid,
        actor_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        /// Lines put back on the shelf, if the update released stock
        restocked: Vec<StockLine>,
    },
    InvoiceIssued {
        company_id: Uuid,
        actor_id: Uuid,
        invoice_id: Uuid,
        order_id: Uuid,
        total: Decimal,
    },
    ReturnRecorded {
        company_id: Uuid,
        actor_id: Uuid,
        return_id: Uuid,
        sale_id: Uuid,
        line: StockLine,
    },
    ReturnReversed {
        company_id: Uuid,
        actor_id: Uuid,
        return_id: Uuid,
        sale_id: Uuid,
        line: StockLine,
    },
    ProductChanged {
        company_id: Uuid,
        actor_id: Uuid,
        change: ProductChange,
        line: StockLine,
    },
    NotificationCreated {
        company_id: Uuid,
        user_id: Option<Uuid>,
        notification_id: Uuid,
        title: String,
        message: String,
    },
    UnreadCountChanged {
        company_id: Uuid,
        user_id: Uuid,
        unread_count: i64,
    },
}

/// A movement entry derived from an event
#[derive(Debug, Clone, PartialEq)]
pub struct MovementEntry {
    pub movement_type: MovementType,
    pub entity_id: Uuid,
    pub description: String,
    pub details: serde_json::Value,
}

impl DomainEvent {
    pub fn company_id(&self) -> Uuid {
        match self {
            DomainEvent::SaleRecorded { company_id, .. }
            | DomainEvent::OrderCreated { company_id, .. }
            | DomainEvent::OrderUpdated { company_id, .. }
            | DomainEvent::InvoiceIssued { company_id, .. }
            | DomainEvent::ReturnRecorded { company_id, .. }
            | DomainEvent::ReturnReversed { company_id, .. }
            | DomainEvent::ProductChanged { company_id, .. }
            | DomainEvent::NotificationCreated { company_id, .. }
            | DomainEvent::UnreadCountChanged { company_id, .. } => *company_id,
        }
    }

    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::SaleRecorded { actor_id, .. }
            | DomainEvent::OrderCreated { actor_id, .. }
            | DomainEvent::OrderUpdated { actor_id, .. }
            | DomainEvent::InvoiceIssued { actor_id, .. }
            | DomainEvent::ReturnRecorded { actor_id, .. }
            | DomainEvent::ReturnReversed { actor_id, .. }
            | DomainEvent::ProductChanged { actor_id, .. } => Some(*actor_id),
            DomainEvent::NotificationCreated { .. } | DomainEvent::UnreadCountChanged { .. } => {
                None
            }
        }
    }

    /// Products whose quantity may have dropped and need a low-stock check
    pub fn stock_checks(&self) -> Vec<Uuid> {
        match self {
            DomainEvent::SaleRecorded { lines, .. } | DomainEvent::OrderCreated { lines, .. } => {
                lines.iter().map(|l| l.product_id).collect()
            }
            DomainEvent::ReturnReversed { line, .. } => vec![line.product_id],
            DomainEvent::ProductChanged { change, line, .. } => match change {
                ProductChange::Created | ProductChange::Restocked | ProductChange::Updated => {
                    vec![line.product_id]
                }
                ProductChange::Deleted => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// The audit-trail entry for this event, if it has one
    pub fn movement(&self) -> Option<MovementEntry> {
        let entry = match self {
            DomainEvent::SaleRecorded { sale_id, total, lines, .. } => MovementEntry {
                movement_type: MovementType::Sale,
                entity_id: *sale_id,
                description: format!("Sale of {} item(s) totalling {}", item_count(lines), total),
                details: json!({ "items": lines, "total": total }),
            },
            DomainEvent::OrderCreated { order_id, status, total, lines, .. } => MovementEntry {
                movement_type: MovementType::Order,
                entity_id: *order_id,
                description: format!("Order created with {} item(s)", item_count(lines)),
                details: json!({ "items": lines, "total": total, "status": status }),
            },
            DomainEvent::OrderUpdated { order_id, status, restocked, .. } => MovementEntry {
                movement_type: MovementType::OrderUpdate,
                entity_id: *order_id,
                description: format!("Order moved to {}", status),
                details: json!({ "status": status, "restocked": restocked }),
            },
            DomainEvent::InvoiceIssued { invoice_id, order_id, total, .. } => MovementEntry {
                movement_type: MovementType::Invoice,
                entity_id: *invoice_id,
                description: format!("Invoice issued for order {}", order_id),
                details: json!({ "order_id": order_id, "total": total }),
            },
            DomainEvent::ReturnRecorded { return_id, sale_id, line, .. } => MovementEntry {
                movement_type: MovementType::Return,
                entity_id: *return_id,
                description: format!("Returned {} x {}", line.quantity, line.name),
                details: json!({ "sale_id": sale_id, "item": line }),
            },
            DomainEvent::ReturnReversed { return_id, sale_id, line, .. } => MovementEntry {
                movement_type: MovementType::ReturnReversal,
                entity_id: *return_id,
                description: format!("Return of {} x {} cancelled", line.quantity, line.name),
                details: json!({ "sale_id": sale_id, "item": line }),
            },
            DomainEvent::ProductChanged { change, line, .. } => {
                let (movement_type, verb) = match change {
                    ProductChange::Created => (MovementType::CreateProduct, "created"),
                    ProductChange::Restocked => (MovementType::UpdateProduct, "restocked"),
                    ProductChange::Updated => (MovementType::UpdateProduct, "updated"),
                    ProductChange::Deleted => (MovementType::DeleteProduct, "deleted"),
                };
                MovementEntry {
                    movement_type,
                    entity_id: line.product_id,
                    description: format!("Product {} {}", line.name, verb),
                    details: json!({ "change": change, "product": line }),
                }
            }
            DomainEvent::NotificationCreated { .. } | DomainEvent::UnreadCountChanged { .. } => {
                return None
            }
        };
        Some(entry)
    }
}

fn item_count(lines: &[StockLine]) -> i32 {
    lines.iter().map(|l| l.quantity).sum()
}

/// Broadcast channel for domain events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Domain event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}
