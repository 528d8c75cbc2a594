use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// How a recipe entry draws on its ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UsageType {
    /// Consumed in direct proportion to units ordered; deducted per order.
    PerOrder,
    /// Drawn from a shared prepared batch; cost-apportioned only, never
    /// deducted per order.
    PerBatch,
}

/// A rule linking one menu item to one ingredient: how much is used per
/// ordered unit and what one purchased lot of the ingredient costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub ingredient_id: Uuid,
    pub usage_per_order: f64,
    pub usage_type: UsageType,
    pub purchase_price: f64,
    pub purchase_quantity: f64,
    pub purchase_unit: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecipeEntry {
    /// Cost of one purchase unit of the ingredient. Guarded divide: entries
    /// with a non-positive purchase quantity cost 0 rather than dividing by
    /// zero.
    pub fn unit_cost(&self) -> f64 {
        if self.purchase_quantity > 0.0 {
            self.purchase_price / self.purchase_quantity
        } else {
            0.0
        }
    }
}

/// One line of a submitted order. `menu_item_id` may be absent during
/// transitional states; the engine treats that as "no recipe entries".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub menu_item_id: Option<Uuid>,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}

/// Current quantity on hand for one ingredient.
///
/// `quantity` may legitimately go negative after a deduction: the engine does
/// not clamp, an oversold condition is an observable state the availability
/// check upstream should have prevented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientStock {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub reorder_level: f64,
    pub supplier_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Ephemeral per-invocation accumulator mapping ingredient id to total
/// required quantity. Merge semantics are plain summation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedUsage {
    totals: HashMap<Uuid, f64>,
}

impl AggregatedUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` to the running total for `ingredient_id`. A zero
    /// quantity still materializes the entry, which keeps the set of touched
    /// ingredients deterministic regardless of line quantities.
    pub fn add(&mut self, ingredient_id: Uuid, quantity: f64) {
        *self.totals.entry(ingredient_id).or_insert(0.0) += quantity;
    }

    pub fn get(&self, ingredient_id: &Uuid) -> f64 {
        self.totals.get(ingredient_id).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &f64)> {
        self.totals.iter()
    }

    pub fn ingredient_ids(&self) -> impl Iterator<Item = &Uuid> {
        self.totals.keys()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Entries sorted by ingredient id, for deterministic processing and
    /// reporting order.
    pub fn sorted_entries(&self) -> Vec<(Uuid, f64)> {
        let mut entries: Vec<(Uuid, f64)> = self.totals.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

/// An ingredient whose required quantity exceeds currently available stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub required: f64,
    pub available: f64,
}

/// Result of a pre-flight availability check. Not an error: shortfalls are a
/// normal value the caller uses to decide whether to proceed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub is_available: bool,
    pub shortfalls: Vec<Shortfall>,
}

impl AvailabilityReport {
    pub fn available() -> Self {
        Self {
            is_available: true,
            shortfalls: Vec::new(),
        }
    }

    pub fn with_shortfalls(shortfalls: Vec<Shortfall>) -> Self {
        Self {
            is_available: shortfalls.is_empty(),
            shortfalls,
        }
    }
}

/// One successfully persisted stock change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedStockChange {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub previous_quantity: f64,
    pub new_quantity: f64,
    /// Signed delta actually applied (negative for deduction).
    pub delta: f64,
}

/// A stock write that was attempted and failed at the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStockChange {
    pub ingredient_id: Uuid,
    pub reason: String,
}

/// Structured result of one deduct/restore pass, enumerating exactly what
/// happened per ingredient so the caller can decide on partial-success
/// policy instead of relying on best-effort logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockMutationOutcome {
    pub applied: Vec<AppliedStockChange>,
    /// Ingredients with aggregated usage but no stock record. Skipped, by
    /// policy: untracked ingredients never block an order.
    pub missing: Vec<Uuid>,
    pub failed: Vec<FailedStockChange>,
}

impl StockMutationOutcome {
    pub fn fully_applied(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Projected effect of an order on each tracked ingredient, for confirmation
/// screens. Read-only counterpart of a deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockImpact {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub current_stock: f64,
    pub usage: f64,
    pub remaining_stock: f64,
}

/// Fulfillment states of an order. The reconciliation engine itself is
/// state-agnostic; `services::orders` owns the transition rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub created_at: Option<DateTime<Utc>>,
}
