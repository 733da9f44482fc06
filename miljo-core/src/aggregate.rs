//! Reduce transaction rows into ranked per-category totals.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::grid::Cell;

/// Column layout of the purchasing export: category name, then cost and
/// quantity far out to the right.
pub const CATEGORY_COL: usize = 1;
pub const COST_COL: usize = 12;
pub const QUANTITY_COL: usize = 13;

/// Ranking keeps at most this many categories.
pub const MAX_RANKED: usize = 20;

/// Running totals for one category observed in the transaction sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAggregate {
    pub name: String,
    pub total_cost: f64,
    pub total_quantity: f64,
    pub count: usize,
}

impl CategoryAggregate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_cost: 0.0,
            total_quantity: 0.0,
            count: 0,
        }
    }
}

/// Aggregate transaction rows per category and rank by cost.
///
/// Rows without a category or without a positive cost are skipped, and
/// malformed numbers count as zero rather than failing: purchasing exports
/// routinely carry blank or mistyped cells in the numeric columns. The sort
/// is stable, so categories with equal cost keep their encounter order, and
/// only the [`MAX_RANKED`] most expensive survive.
pub fn aggregate_rows(rows: &[Vec<Cell>]) -> Vec<CategoryAggregate> {
    let mut aggregates: Vec<CategoryAggregate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let name = row
            .get(CATEGORY_COL)
            .map(|c| c.display().trim().to_string())
            .unwrap_or_default();
        let cost = row
            .get(COST_COL)
            .and_then(|c| c.as_number())
            .unwrap_or(0.0);
        let quantity = row
            .get(QUANTITY_COL)
            .and_then(|c| c.as_number())
            .unwrap_or(0.0);

        if name.is_empty() || cost <= 0.0 {
            continue;
        }

        let slot = *index.entry(name.clone()).or_insert_with(|| {
            aggregates.push(CategoryAggregate::new(name.clone()));
            aggregates.len() - 1
        });

        let agg = &mut aggregates[slot];
        agg.total_cost += cost;
        agg.total_quantity += quantity;
        agg.count += 1;
    }

    aggregates.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(Ordering::Equal)
    });
    aggregates.truncate(MAX_RANKED);
    aggregates
}
