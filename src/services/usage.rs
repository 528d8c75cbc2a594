//! Ingredient usage aggregation across order lines.

use crate::models::{AggregatedUsage, OrderLine, UsageType};
use crate::services::recipes::RecipeIndex;

/// Which recipe entries participate in an aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageFilter {
    /// Only `per_order` entries: stock deduction, restoration and
    /// availability checks. `per_batch` entries never mutate stock.
    PerOrderOnly,
    /// Every entry, regardless of usage type: impact summaries.
    All,
}

impl UsageFilter {
    fn admits(self, usage_type: UsageType) -> bool {
        match self {
            UsageFilter::PerOrderOnly => usage_type == UsageType::PerOrder,
            UsageFilter::All => true,
        }
    }
}

/// Collapses order lines into net ingredient consumption: for every recipe
/// entry matched to a line, `usage_per_order * line.quantity` is summed into
/// the total for that ingredient. Totals accumulate across multiple entries
/// for the same ingredient and across lines sharing an ingredient. Lines with
/// zero quantity contribute zero but still materialize their ingredients.
pub fn aggregate_usage(
    lines: &[OrderLine],
    index: &RecipeIndex,
    filter: UsageFilter,
) -> AggregatedUsage {
    let mut usage = AggregatedUsage::new();

    for line in lines {
        for entry in index.entries_for(line.menu_item_id) {
            if filter.admits(entry.usage_type) {
                usage.add(entry.ingredient_id, entry.usage_per_order * f64::from(line.quantity));
            }
        }
    }

    usage
}
