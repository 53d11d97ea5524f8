//! Realtime push over WebSocket
//!
//! Each connection subscribes to the event bus and forwards the events of
//! its own company as `{event, payload}` JSON frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::DomainEvent;
use crate::middleware::{AuthUser, TenantUser};
use crate::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Frame sent to the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub event: &'static str,
    pub payload: serde_json::Value,
}

/// Translate a domain event into a push frame for one connected user
pub fn push_for(event: &DomainEvent, company_id: Uuid, user_id: Uuid) -> Option<PushMessage> {
    if event.company_id() != company_id {
        return None;
    }

    match event {
        DomainEvent::OrderCreated {
            order_id, status, total, ..
        } => Some(PushMessage {
            event: "order:created",
            payload: json!({ "order_id": order_id, "status": status, "total": total }),
        }),
        DomainEvent::OrderUpdated {
            order_id, status, ..
        } => Some(PushMessage {
            event: "order:updated",
            payload: json!({ "order_id": order_id, "status": status }),
        }),
        DomainEvent::NotificationCreated {
            user_id: recipient,
            notification_id,
            title,
            message,
            ..
        } if recipient.map_or(true, |r| r == user_id) => Some(PushMessage {
            event: "notification:new",
            payload: json!({ "id": notification_id, "title": title, "message": message }),
        }),
        DomainEvent::UnreadCountChanged {
            user_id: recipient,
            unread_count,
            ..
        } if *recipient == user_id => Some(PushMessage {
            event: "notification:count",
            payload: json!({ "count": unread_count }),
        }),
        _ => None,
    }
}

/// `GET /ws?token=...`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> AppResult<Response> {
    let claims = state.keys.verify(&query.token)?;
    let user = TenantUser::try_from(AuthUser::from(claims))?;

    tracing::info!(user_id = %user.user_id, company_id = %user.company_id, "Realtime client connected");
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: TenantUser) {
    let (mut sender, mut receiver) = socket.split();
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(64);

    let outgoing_handle = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut events = state.events.subscribe();
    let events_tx = outgoing_tx.clone();
    let events_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Some(push) = push_for(&event, user.company_id, user.user_id) else {
                        continue;
                    };
                    match serde_json::to_string(&push) {
                        Ok(text) => {
                            if events_tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(?e, "Failed to encode push frame"),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user.user_id, skipped, "Realtime receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let ping_tx = outgoing_tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ticker = interval(PING_INTERVAL);
        loop {
            ticker.tick().await;
            if ping_tx.send(Message::Ping(Vec::new())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Ping(data)) => {
                let _ = outgoing_tx.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(?e, "Realtime socket error");
                break;
            }
        }
    }

    ping_handle.abort();
    events_handle.abort();
    outgoing_handle.abort();
    tracing::info!(user_id = %user.user_id, "Realtime client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::OrderStatus;

    fn order_created(company_id: Uuid) -> DomainEvent {
        DomainEvent::OrderCreated {
            company_id,
            actor_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            total: Decimal::new(1500, 2),
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_other_company_events_are_filtered() {
        let event = order_created(Uuid::new_v4());
        assert!(push_for(&event, Uuid::new_v4(), Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_order_created_is_pushed() {
        let company_id = Uuid::new_v4();
        let push = push_for(&order_created(company_id), company_id, Uuid::new_v4()).unwrap();
        assert_eq!(push.event, "order:created");
    }

    #[test]
    fn test_unread_count_goes_to_its_user_only() {
        let company_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let event = DomainEvent::UnreadCountChanged {
            company_id,
            user_id: owner,
            unread_count: 3,
        };

        let push = push_for(&event, company_id, owner).unwrap();
        assert_eq!(push.event, "notification:count");
        assert_eq!(push.payload["count"], 3);
        assert!(push_for(&event, company_id, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_broadcast_notification_reaches_everyone() {
        let company_id = Uuid::new_v4();
        let event = DomainEvent::NotificationCreated {
            company_id,
            user_id: None,
            notification_id: Uuid::new_v4(),
            title: "Low stock".to_string(),
            message: "Rice 5kg has 2 units left".to_string(),
        };

        let push = push_for(&event, company_id, Uuid::new_v4()).unwrap();
        assert_eq!(push.event, "notification:new");
    }
}
