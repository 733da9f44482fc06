//! Classification result schema shared by the model path and the local
//! fallback, plus the normalization that keeps its totals honest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Both classification paths return at most this many categories.
pub const MAX_CATEGORIES: usize = 10;

/// Per-category estimates plus workbook-wide totals and advice.
///
/// The shape doubles as the JSON contract for the external model, hence the
/// camelCase field names and the defaults: a model that omits a field still
/// parses, and normalization fills in the sums it got wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassificationResult {
    pub categories: Vec<ClassifiedCategory>,
    pub summary: Summary,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifiedCategory {
    pub name: String,
    /// Sample item descriptions the model grouped under this category.
    pub items: Vec<String>,
    pub totals: CategoryTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryTotals {
    pub quantity: f64,
    /// Emissions per gas key, e.g. `"co2"` in kg.
    pub emissions: BTreeMap<String, f64>,
    pub cost: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub total_emissions: BTreeMap<String, f64>,
    pub total_cost: f64,
    pub total_energy: f64,
    pub total_items: f64,
}

impl ClassifiedCategory {
    /// Emissions summed across every gas key.
    pub fn emissions_sum(&self) -> f64 {
        self.totals.emissions.values().sum()
    }
}

impl ClassificationResult {
    /// Emissions summed across every gas key in the summary.
    pub fn total_emissions_sum(&self) -> f64 {
        self.summary.total_emissions.values().sum()
    }

    /// Cap the category list at [`MAX_CATEGORIES`] and recompute the summary
    /// sums from the categories. Model output is not trusted to add up; the
    /// fallback goes through here too so both paths share one guarantee:
    /// `summary.total_cost` and `summary.total_emissions` always equal the
    /// per-category sums.
    pub fn normalize(mut self) -> Self {
        self.categories.truncate(MAX_CATEGORIES);

        let mut total_cost = 0.0;
        let mut total_emissions: BTreeMap<String, f64> = BTreeMap::new();
        for category in &self.categories {
            total_cost += category.totals.cost;
            for (gas, value) in &category.totals.emissions {
                *total_emissions.entry(gas.clone()).or_insert(0.0) += value;
            }
        }

        self.summary.total_cost = total_cost;
        self.summary.total_emissions = total_emissions;
        self
    }

    /// True when the summary sums match the categories within tolerance.
    pub fn totals_consistent(&self) -> bool {
        let cost_sum: f64 = self.categories.iter().map(|c| c.totals.cost).sum();
        if (cost_sum - self.summary.total_cost).abs() > 1e-6 {
            return false;
        }

        let mut emission_sums: BTreeMap<&str, f64> = BTreeMap::new();
        for category in &self.categories {
            for (gas, value) in &category.totals.emissions {
                *emission_sums.entry(gas.as_str()).or_insert(0.0) += value;
            }
        }
        emission_sums.iter().all(|(gas, sum)| {
            self.summary
                .total_emissions
                .get(*gas)
                .is_some_and(|total| (total - sum).abs() <= 1e-6)
        })
    }
}
