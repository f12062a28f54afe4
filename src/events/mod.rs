use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::order::OrderStatus;
use crate::errors::ServiceError;

/// Events emitted by the services after a successful state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCommitted {
        order_id: Uuid,
        user_id: Uuid,
        item_count: usize,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderDeleted(Uuid),

    // Stock events
    CatalogReplaced {
        stock_type: String,
        row_count: usize,
    },
    StockReset {
        stock_type: String,
    },
    StockRestored {
        order_id: Uuid,
    },

    // Cart events
    CartItemAdded {
        user_id: Uuid,
        part_number: String,
    },
    CartCleared(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends an event, logging rather than propagating delivery failure.
    /// State changes must not be rolled back because a listener went away.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Failed to deliver event {:?}: {}", event, e);
        }
    }
}

/// Drains the event channel, logging each event. Runs as a background task
/// spawned from the process entry point.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCommitted {
                order_id,
                user_id,
                item_count,
            } => {
                info!(order_id = %order_id, user_id = %user_id, item_count = item_count, "Order committed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, ?old_status, ?new_status, "Order status changed");
            }
            Event::StockRestored { order_id } => {
                info!(order_id = %order_id, "Stock restored from order");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
