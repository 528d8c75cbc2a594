//! Order-level service: the fulfillment status machine and its coupling to
//! inventory reconciliation, plus pure order arithmetic helpers.

use std::cmp::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{AvailabilityReport, Order, OrderLine, OrderStatus, StockMutationOutcome};
use crate::repositories::{InventoryStore, OrderStore, RecipeStore};
use crate::services::reconciliation::ReconciliationService;

/// Result of a status transition, carrying the reconciliation outcome (or
/// the error that prevented it) so the caller can tell whether the order's
/// inventory impact was fully applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub order: Order,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Present when the transition triggered a deduction or restoration.
    pub reconciliation: Option<StockMutationOutcome>,
    /// Set when reconciliation aborted after the status change had already
    /// been persisted.
    pub reconciliation_error: Option<String>,
}

/// Whether an order may move from `from` to `to`.
///
/// `Pending → Completed` is allowed directly for counter orders with no
/// preparation step. Cancellation is reachable from every non-cancelled
/// state; cancelling a completed order is what triggers stock restoration.
pub fn valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Pending, Preparing) | (Pending, Completed) | (Preparing, Ready) | (Ready, Completed) => {
            true
        }
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

/// Subtotal for one order line. A negative price is a caller-side validation
/// bug and fails immediately.
pub fn calculate_line_subtotal(price: Decimal, quantity: u32) -> Result<Decimal, ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(
            "price must be non-negative".to_string(),
        ));
    }
    Ok(price * Decimal::from(quantity))
}

/// Total amount of an order: the sum of its line subtotals.
pub fn calculate_order_total(lines: &[OrderLine]) -> Decimal {
    lines.iter().map(|line| line.subtotal).sum()
}

/// Structural validity of a set of order lines prior to submission.
pub fn validate_order_lines(lines: &[OrderLine]) -> bool {
    !lines.is_empty()
        && lines.iter().all(|line| {
            line.quantity > 0
                && line.subtotal >= Decimal::ZERO
                && line.menu_item_id.is_some()
                && line.order_id.is_some()
        })
}

/// Sorts orders for the service queue display: pending/preparing/ready views
/// show the earliest order first, completed and cancelled views the latest.
/// Orders without a timestamp sink to the end either way.
pub fn sort_orders_for_queue(mut orders: Vec<Order>, status: OrderStatus) -> Vec<Order> {
    let ascending = matches!(
        status,
        OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
    );

    orders.sort_by(|a, b| match (a.created_at, b.created_at) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a_time), Some(b_time)) => {
            if ascending {
                a_time.cmp(&b_time)
            } else {
                b_time.cmp(&a_time)
            }
        }
    });

    orders
}

/// Drives order status transitions and their inventory side effects: moving
/// into `Completed` deducts stock exactly once, cancelling a completed order
/// restores it exactly once. The transition table rejects re-entry, which is
/// what keeps each order's inventory impact single-application.
pub struct OrderService<R, I, O> {
    orders: Arc<O>,
    reconciliation: ReconciliationService<R, I>,
    event_sender: Option<EventSender>,
}

impl<R, I, O> OrderService<R, I, O>
where
    R: RecipeStore,
    I: InventoryStore,
    O: OrderStore,
{
    pub fn new(orders: Arc<O>, reconciliation: ReconciliationService<R, I>) -> Self {
        Self {
            orders,
            reconciliation,
            event_sender: None,
        }
    }

    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Pre-flight availability check for an existing order's lines.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn check_order_availability(
        &self,
        order_id: Uuid,
    ) -> Result<AvailabilityReport, ServiceError> {
        let lines = self.orders.fetch_order_lines(order_id).await?;
        self.reconciliation.check_availability(&lines).await
    }

    /// Moves an order to a new status, persisting the change and running the
    /// inventory side effect the transition implies.
    ///
    /// The status change is persisted before reconciliation runs; if
    /// reconciliation then fails, the failure is surfaced on the returned
    /// change record rather than rolling the status back.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderStatusChange, ServiceError> {
        let order = self
            .orders
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        if !valid_transition(old_status, new_status) {
            warn!(
                old_status = %old_status,
                "Rejected invalid status transition"
            );
            return Err(ServiceError::InvalidStatus(format!(
                "cannot transition from '{}' to '{}'",
                old_status, new_status
            )));
        }

        let mut updated = order;
        updated.status = new_status;
        self.orders.persist_order(updated.clone()).await?;
        info!(old_status = %old_status, "Order status updated");

        self.send_status_events(order_id, old_status, new_status).await;

        let (reconciliation, reconciliation_error) =
            match self.run_reconciliation(order_id, old_status, new_status).await {
                Ok(outcome) => (outcome, None),
                Err(e) => {
                    error!(
                        error = %e,
                        "Reconciliation failed after status change was persisted"
                    );
                    (None, Some(e.to_string()))
                }
            };

        Ok(OrderStatusChange {
            order: updated,
            old_status,
            new_status,
            reconciliation,
            reconciliation_error,
        })
    }

    /// Cancels an order, restoring stock if it had been completed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderStatusChange, ServiceError> {
        self.update_order_status(order_id, OrderStatus::Cancelled)
            .await
    }

    async fn run_reconciliation(
        &self,
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    ) -> Result<Option<StockMutationOutcome>, ServiceError> {
        match (old_status, new_status) {
            // Entering the consuming state: deduct exactly once.
            (_, OrderStatus::Completed) => {
                let lines = self.orders.fetch_order_lines(order_id).await?;
                let outcome = self.reconciliation.deduct_inventory_for_order(&lines).await?;
                Ok(Some(outcome))
            }
            // Cancelling after completion reverses the prior deduction. A
            // cancellation before completion never deducted, so there is
            // nothing to restore.
            (OrderStatus::Completed, OrderStatus::Cancelled) => {
                let lines = self.orders.fetch_order_lines(order_id).await?;
                let outcome = self.reconciliation.restore_inventory_for_order(&lines).await?;
                Ok(Some(outcome))
            }
            _ => Ok(None),
        }
    }

    async fn send_status_events(
        &self,
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    ) {
        let Some(sender) = &self.event_sender else {
            return;
        };
        if let Err(e) = sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await
        {
            warn!(error = %e, "Failed to send order status changed event");
        }
        let extra = match new_status {
            OrderStatus::Completed => Some(Event::OrderCompleted(order_id)),
            OrderStatus::Cancelled => Some(Event::OrderCancelled(order_id)),
            _ => None,
        };
        if let Some(event) = extra {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send order event");
            }
        }
    }
}
