//! Pure cost and pricing computations.
//!
//! None of these functions perform I/O or fail: malformed numeric input is
//! clamped or guarded (non-finite intermediates count as 0, divides are
//! guarded) and every result is rounded half-up at the requested precision
//! and floored at 0.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{RecipeEntry, UsageType};

/// Rounds half-up at `precision` decimal places. Inputs are non-negative by
/// the time this runs, so round-half-away-from-zero is round-half-up.
fn round_half_up(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

fn sum_per_order<'a>(entries: impl Iterator<Item = &'a RecipeEntry>) -> f64 {
    entries
        .filter(|e| e.usage_type == UsageType::PerOrder)
        .map(|e| finite_or_zero(e.unit_cost() * e.usage_per_order))
        .sum()
}

/// Ingredient cost of serving one order, from `per_order` entries only.
/// `per_batch` entries are excluded when no batch-servings context is
/// supplied; see [`ingredient_cost_per_order_with_batches`].
pub fn ingredient_cost_per_order(entries: &[RecipeEntry], precision: u32) -> f64 {
    round_half_up(clamp_non_negative(sum_per_order(entries.iter())), precision)
}

pub(crate) fn ingredient_cost_per_order_ref(entries: &[&RecipeEntry], precision: u32) -> f64 {
    round_half_up(
        clamp_non_negative(sum_per_order(entries.iter().copied())),
        precision,
    )
}

/// Ingredient cost per order including `per_batch` entries, apportioned by
/// expected servings: each batch entry contributes
/// `purchase_price / expected_servings` for its ingredient. Entries whose
/// ingredient is missing from the map, or has non-positive servings,
/// contribute 0.
pub fn ingredient_cost_per_order_with_batches(
    entries: &[RecipeEntry],
    batch_servings: &HashMap<Uuid, f64>,
    precision: u32,
) -> f64 {
    let total: f64 = entries
        .iter()
        .map(|entry| match entry.usage_type {
            UsageType::PerOrder => finite_or_zero(entry.unit_cost() * entry.usage_per_order),
            UsageType::PerBatch => match batch_servings.get(&entry.ingredient_id) {
                Some(&servings) if servings > 0.0 => {
                    finite_or_zero(entry.purchase_price / servings)
                }
                _ => 0.0,
            },
        })
        .sum();

    round_half_up(clamp_non_negative(total), precision)
}

/// Sale price that yields the target profit margin over cost:
/// `cost * (1 + profit_percent / 100)`.
pub fn suggested_price_for_target_profit(
    cost_per_order: f64,
    profit_percent: f64,
    precision: u32,
) -> f64 {
    let cost = clamp_non_negative(cost_per_order);
    let pct = clamp_non_negative(profit_percent);
    round_half_up(cost * (1.0 + pct / 100.0), precision)
}

/// Realized profit per order at a chosen price, never negative.
pub fn profit_per_order_for_price(price: f64, cost_per_order: f64, precision: u32) -> f64 {
    let price = clamp_non_negative(price);
    let cost = clamp_non_negative(cost_per_order);
    round_half_up((price - cost).max(0.0), precision)
}
