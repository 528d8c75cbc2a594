//! Order fulfillment inventory reconciliation: translating an order's
//! menu-item quantities into ingredient-level availability checks and stock
//! mutations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    AppliedStockChange, AvailabilityReport, FailedStockChange, IngredientStock, OrderLine,
    Shortfall, StockImpact, StockMutationOutcome,
};
use crate::repositories::{InventoryStore, RecipeStore};
use crate::services::recipes::{menu_item_ids, RecipeIndex};
use crate::services::usage::{aggregate_usage, UsageFilter};

/// Sign of a stock mutation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationDirection {
    Deduct,
    Restore,
}

impl MutationDirection {
    fn signed(self, usage: f64) -> f64 {
        match self {
            MutationDirection::Deduct => -usage,
            MutationDirection::Restore => usage,
        }
    }
}

/// Orchestrates recipe resolution, usage aggregation, availability checks and
/// stock mutation against the backing stores.
///
/// Concurrency contract: within one invocation, same-ingredient usage is
/// folded into a single write before anything is persisted, so at most one
/// write per ingredient is issued and writes to distinct ingredients run
/// concurrently. Across invocations there is no locking: two concurrent
/// deductions touching the same ingredient can lose an update. Guarding
/// against that requires a conditional update primitive at the store layer.
pub struct ReconciliationService<R, I> {
    recipes: Arc<R>,
    inventory: Arc<I>,
    event_sender: Option<EventSender>,
}

// Manual Clone: the stores live behind Arcs, so cloning never requires
// R: Clone or I: Clone.
impl<R, I> Clone for ReconciliationService<R, I> {
    fn clone(&self) -> Self {
        Self {
            recipes: Arc::clone(&self.recipes),
            inventory: Arc::clone(&self.inventory),
            event_sender: self.event_sender.clone(),
        }
    }
}

impl<R, I> ReconciliationService<R, I>
where
    R: RecipeStore,
    I: InventoryStore,
{
    pub fn new(recipes: Arc<R>, inventory: Arc<I>) -> Self {
        Self {
            recipes,
            inventory,
            event_sender: None,
        }
    }

    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Pre-flight check: does current stock cover the `per_order` ingredient
    /// usage of these lines?
    ///
    /// Ingredients without a stock record are skipped: untracked ingredients
    /// never block an order. Read-only, no reservation; the result reflects
    /// stock at call time only.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn check_availability(
        &self,
        lines: &[OrderLine],
    ) -> Result<AvailabilityReport, ServiceError> {
        let menu_ids = menu_item_ids(lines);
        let entries = self
            .recipes
            .fetch_recipe_entries_for_menu_items(&menu_ids)
            .await?;
        let index = RecipeIndex::build(entries);
        let usage = aggregate_usage(lines, &index, UsageFilter::PerOrderOnly);
        if usage.is_empty() {
            debug!("No per-order ingredient usage, order is trivially available");
            return Ok(AvailabilityReport::available());
        }

        let mut shortfalls = Vec::new();
        for (ingredient_id, required) in usage.sorted_entries() {
            if required <= 0.0 {
                continue;
            }
            match self.inventory.fetch_ingredient_stock(ingredient_id).await? {
                Some(stock) if stock.quantity < required => {
                    shortfalls.push(Shortfall {
                        ingredient_id,
                        ingredient_name: stock.name.clone(),
                        required,
                        available: stock.quantity,
                    });
                }
                Some(_) => {}
                None => {
                    debug!(ingredient_id = %ingredient_id, "No stock record, skipping availability check");
                }
            }
        }

        let report = AvailabilityReport::with_shortfalls(shortfalls);
        info!(
            is_available = report.is_available,
            shortfall_count = report.shortfalls.len(),
            "Availability check complete"
        );
        Ok(report)
    }

    /// Deducts aggregated `per_order` ingredient usage for the given lines
    /// from stock. Call exactly once per order, when it moves into its
    /// consuming state.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn deduct_inventory_for_order(
        &self,
        lines: &[OrderLine],
    ) -> Result<StockMutationOutcome, ServiceError> {
        let outcome = self.apply_stock_delta(lines, MutationDirection::Deduct).await?;
        self.emit_mutation_event(lines, &outcome, MutationDirection::Deduct)
            .await;
        Ok(outcome)
    }

    /// Restores previously deducted usage, the exact inverse of
    /// [`deduct_inventory_for_order`]. The engine does not track whether a
    /// deduction actually happened; invoking restoration only for orders that
    /// were deducted is the caller's responsibility (`services::orders` does
    /// this bookkeeping via its status machine).
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn restore_inventory_for_order(
        &self,
        lines: &[OrderLine],
    ) -> Result<StockMutationOutcome, ServiceError> {
        let outcome = self.apply_stock_delta(lines, MutationDirection::Restore).await?;
        self.emit_mutation_event(lines, &outcome, MutationDirection::Restore)
            .await;
        Ok(outcome)
    }

    /// Projected per-ingredient effect of the given lines, for confirmation
    /// screens. Covers tracked ingredients only; aggregation here includes
    /// every usage type since nothing is mutated.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn inventory_impact_summary(
        &self,
        lines: &[OrderLine],
    ) -> Result<Vec<StockImpact>, ServiceError> {
        let menu_ids = menu_item_ids(lines);
        let entries = self
            .recipes
            .fetch_recipe_entries_for_menu_items(&menu_ids)
            .await?;
        let index = RecipeIndex::build(entries);
        let usage = aggregate_usage(lines, &index, UsageFilter::All);

        let mut impacts = Vec::new();
        for (ingredient_id, total_usage) in usage.sorted_entries() {
            if let Some(stock) = self.inventory.fetch_ingredient_stock(ingredient_id).await? {
                impacts.push(StockImpact {
                    ingredient_id,
                    ingredient_name: stock.name.clone(),
                    current_stock: stock.quantity,
                    usage: total_usage,
                    remaining_stock: stock.quantity - total_usage,
                });
            }
        }
        Ok(impacts)
    }

    /// Shared deduct/restore pass: resolve, aggregate, prefetch stock in one
    /// round trip, then fan out at most one write per distinct ingredient.
    ///
    /// A recipe or stock prefetch failure aborts the whole pass with no
    /// writes issued. Individual write failures do not stop the other
    /// ingredients; they are recorded on the outcome for the caller to judge.
    async fn apply_stock_delta(
        &self,
        lines: &[OrderLine],
        direction: MutationDirection,
    ) -> Result<StockMutationOutcome, ServiceError> {
        let entries = self.recipes.fetch_all_recipe_entries().await?;
        let index = RecipeIndex::build(entries);
        let usage = aggregate_usage(lines, &index, UsageFilter::PerOrderOnly);

        let mut outcome = StockMutationOutcome::default();
        if usage.is_empty() {
            debug!("No per-order ingredient usage, nothing to reconcile");
            return Ok(outcome);
        }

        let touched: HashSet<Uuid> = usage.ingredient_ids().copied().collect();
        let all_stock = self.inventory.fetch_all_ingredient_stock().await?;
        let mut stock_map: HashMap<Uuid, IngredientStock> = all_stock
            .into_iter()
            .filter(|s| touched.contains(&s.id))
            .map(|s| (s.id, s))
            .collect();

        let mut writes = Vec::new();
        for (ingredient_id, total_usage) in usage.sorted_entries() {
            if total_usage == 0.0 {
                debug!(ingredient_id = %ingredient_id, "Zero aggregated usage, skipping write");
                continue;
            }
            let Some(stock) = stock_map.remove(&ingredient_id) else {
                warn!(ingredient_id = %ingredient_id, "Stock record not found, skipping");
                outcome.missing.push(ingredient_id);
                continue;
            };

            let delta = direction.signed(total_usage);
            let previous_quantity = stock.quantity;
            let reorder_level = stock.reorder_level;
            let mut updated = stock;
            updated.quantity = previous_quantity + delta;

            let inventory = Arc::clone(&self.inventory);
            writes.push(async move {
                let name = updated.name.clone();
                let new_quantity = updated.quantity;
                let unit = updated.unit.clone();
                match inventory.persist_ingredient_stock(updated).await {
                    Ok(()) => {
                        info!(
                            ingredient_id = %ingredient_id,
                            ingredient = %name,
                            delta = delta,
                            unit = %unit,
                            new_quantity = new_quantity,
                            "Stock updated"
                        );
                        Ok((
                            AppliedStockChange {
                                ingredient_id,
                                ingredient_name: name,
                                previous_quantity,
                                new_quantity,
                                delta,
                            },
                            reorder_level,
                        ))
                    }
                    Err(e) => {
                        warn!(
                            ingredient_id = %ingredient_id,
                            ingredient = %name,
                            error = %e,
                            "Failed to persist stock update"
                        );
                        Err(FailedStockChange {
                            ingredient_id,
                            reason: e.to_string(),
                        })
                    }
                }
            });
        }

        // Writes target disjoint ingredients; ordering among them must not
        // matter, so fire them all and await the batch.
        let mut at_reorder_level = Vec::new();
        for result in join_all(writes).await {
            match result {
                Ok((change, reorder_level)) => {
                    if direction == MutationDirection::Deduct
                        && change.new_quantity <= reorder_level
                    {
                        at_reorder_level.push((change.ingredient_id, change.new_quantity, reorder_level));
                    }
                    outcome.applied.push(change);
                }
                Err(failure) => outcome.failed.push(failure),
            }
        }

        if let Some(sender) = &self.event_sender {
            for (ingredient_id, quantity, reorder_level) in at_reorder_level {
                if let Err(e) = sender
                    .send(Event::StockBelowReorderLevel {
                        ingredient_id,
                        quantity,
                        reorder_level,
                    })
                    .await
                {
                    warn!(error = %e, "Failed to send reorder-level event");
                }
            }
        }

        info!(
            applied = outcome.applied.len(),
            missing = outcome.missing.len(),
            failed = outcome.failed.len(),
            "Stock reconciliation pass complete"
        );
        Ok(outcome)
    }

    async fn emit_mutation_event(
        &self,
        lines: &[OrderLine],
        outcome: &StockMutationOutcome,
        direction: MutationDirection,
    ) {
        let Some(sender) = &self.event_sender else {
            return;
        };
        let order_id = lines.iter().find_map(|l| l.order_id);
        let event = match direction {
            MutationDirection::Deduct => Event::InventoryDeducted {
                order_id,
                ingredients_updated: outcome.applied.len(),
                ingredients_missing: outcome.missing.len(),
                ingredients_failed: outcome.failed.len(),
            },
            MutationDirection::Restore => Event::InventoryRestored {
                order_id,
                ingredients_updated: outcome.applied.len(),
                ingredients_missing: outcome.missing.len(),
                ingredients_failed: outcome.failed.len(),
            },
        };
        if let Err(e) = sender.send(event).await {
            warn!(error = %e, "Failed to send reconciliation event");
        }
    }
}
