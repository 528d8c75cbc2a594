use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::OrderStatus;

/// Domain events emitted by the engine. Consumers (dashboards, notification
/// fan-out, audit trails) subscribe via `process_events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCompleted(Uuid),
    OrderCancelled(Uuid),

    // Inventory events
    InventoryDeducted {
        order_id: Option<Uuid>,
        ingredients_updated: usize,
        ingredients_missing: usize,
        ingredients_failed: usize,
    },
    InventoryRestored {
        order_id: Option<Uuid>,
        ingredients_updated: usize,
        ingredients_missing: usize,
        ingredients_failed: usize,
    },
    /// Emitted when a deduction drops an ingredient to or below its reorder
    /// level.
    StockBelowReorderLevel {
        ingredient_id: Uuid,
        quantity: f64,
        reorder_level: f64,
    },
}

/// Cloneable handle for emitting events into the processing loop.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a bounded event channel of the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Spawn this on the runtime;
/// it exits when all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::OrderCompleted(order_id) => {
                info!(order_id = %order_id, "Order completed");
            }
            Event::OrderCancelled(order_id) => {
                info!(order_id = %order_id, "Order cancelled");
            }
            Event::InventoryDeducted {
                ingredients_updated,
                ingredients_missing,
                ingredients_failed,
                ..
            }
            | Event::InventoryRestored {
                ingredients_updated,
                ingredients_missing,
                ingredients_failed,
                ..
            } => {
                info!(
                    updated = ingredients_updated,
                    missing = ingredients_missing,
                    failed = ingredients_failed,
                    "Inventory reconciliation event"
                );
            }
            Event::StockBelowReorderLevel {
                ingredient_id,
                quantity,
                reorder_level,
            } => {
                warn!(
                    ingredient_id = %ingredient_id,
                    quantity = quantity,
                    reorder_level = reorder_level,
                    "Ingredient at or below reorder level"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}
