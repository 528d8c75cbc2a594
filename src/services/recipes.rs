//! Recipe resolution: maps menu items to their recipe entries.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{OrderLine, RecipeEntry};
use crate::services::costing;

/// Lookup structure grouping recipe entries by menu item, built once per
/// orchestrator invocation so resolving each order line is O(1) instead of a
/// rescan of the full entry list.
#[derive(Debug, Default)]
pub struct RecipeIndex {
    by_menu_item: HashMap<Uuid, Vec<RecipeEntry>>,
}

impl RecipeIndex {
    pub fn build(entries: Vec<RecipeEntry>) -> Self {
        let mut by_menu_item: HashMap<Uuid, Vec<RecipeEntry>> = HashMap::new();
        for entry in entries {
            by_menu_item.entry(entry.menu_item_id).or_default().push(entry);
        }
        Self { by_menu_item }
    }

    /// Entries for the given menu item. An absent id (line in a transitional
    /// state) or an unknown id resolves to no entries rather than an error.
    pub fn entries_for(&self, menu_item_id: Option<Uuid>) -> &[RecipeEntry] {
        menu_item_id
            .and_then(|id| self.by_menu_item.get(&id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn menu_item_count(&self) -> usize {
        self.by_menu_item.len()
    }
}

/// Distinct menu item ids referenced by the given lines, in first-seen order.
/// Lines without a menu item are skipped.
pub fn menu_item_ids(lines: &[OrderLine]) -> Vec<Uuid> {
    let mut seen = Vec::new();
    for line in lines {
        if let Some(id) = line.menu_item_id {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
    }
    seen
}

/// Per-order ingredient cost for one menu item, from the full recipe entry
/// collection. Unknown menu items cost 0.
pub fn compute_cost_per_order_for_menu_item(
    all_entries: &[RecipeEntry],
    menu_item_id: Uuid,
    precision: u32,
) -> f64 {
    let for_item: Vec<&RecipeEntry> = all_entries
        .iter()
        .filter(|e| e.menu_item_id == menu_item_id)
        .collect();
    costing::ingredient_cost_per_order_ref(&for_item, precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsageType;

    fn entry(menu_item_id: Uuid, ingredient_id: Uuid, usage: f64) -> RecipeEntry {
        RecipeEntry {
            id: Uuid::new_v4(),
            menu_item_id,
            ingredient_id,
            usage_per_order: usage,
            usage_type: UsageType::PerOrder,
            purchase_price: 100.0,
            purchase_quantity: 10.0,
            purchase_unit: "kg".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn line(menu_item_id: Option<Uuid>) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4(),
            order_id: None,
            menu_item_id,
            quantity: 1,
            subtotal: rust_decimal::Decimal::ZERO,
            created_at: None,
        }
    }

    #[test]
    fn index_groups_by_menu_item() {
        let menu_a = Uuid::new_v4();
        let menu_b = Uuid::new_v4();
        let index = RecipeIndex::build(vec![
            entry(menu_a, Uuid::new_v4(), 1.0),
            entry(menu_a, Uuid::new_v4(), 2.0),
            entry(menu_b, Uuid::new_v4(), 3.0),
        ]);

        assert_eq!(index.entries_for(Some(menu_a)).len(), 2);
        assert_eq!(index.entries_for(Some(menu_b)).len(), 1);
        assert_eq!(index.menu_item_count(), 2);
    }

    #[test]
    fn absent_and_unknown_menu_items_resolve_to_no_entries() {
        let index = RecipeIndex::build(vec![entry(Uuid::new_v4(), Uuid::new_v4(), 1.0)]);
        assert!(index.entries_for(None).is_empty());
        assert!(index.entries_for(Some(Uuid::new_v4())).is_empty());
    }

    #[test]
    fn menu_item_ids_dedups_and_skips_absent() {
        let menu_a = Uuid::new_v4();
        let menu_b = Uuid::new_v4();
        let lines = vec![
            line(Some(menu_a)),
            line(None),
            line(Some(menu_b)),
            line(Some(menu_a)),
        ];
        assert_eq!(menu_item_ids(&lines), vec![menu_a, menu_b]);
    }

    #[test]
    fn cost_for_menu_item_filters_entries() {
        let menu_a = Uuid::new_v4();
        let menu_b = Uuid::new_v4();
        // menu_a: (100/10)*0.2 = 2.0, menu_b: (100/10)*1.0 = 10.0
        let entries = vec![
            entry(menu_a, Uuid::new_v4(), 0.2),
            entry(menu_b, Uuid::new_v4(), 1.0),
        ];
        assert_eq!(compute_cost_per_order_for_menu_item(&entries, menu_a, 2), 2.0);
        assert_eq!(
            compute_cost_per_order_for_menu_item(&entries, Uuid::new_v4(), 2),
            0.0
        );
    }
}
