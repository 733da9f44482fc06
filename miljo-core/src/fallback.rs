//! Deterministic, network-free classification used when the model call
//! fails. Substring and keyword matching cover the common Swedish category
//! names; everything else lands on the "övrigt" factor.

use std::collections::BTreeMap;

use crate::aggregate::CategoryAggregate;
use crate::locator::{FactorTable, OTHER_CATEGORY};
use crate::result::{
    CategoryTotals, ClassificationResult, ClassifiedCategory, MAX_CATEGORIES, Summary,
};

/// Ordered keyword buckets: (marker in the factor key, substrings looked for
/// in the category name). Walked top to bottom, first qualifying bucket wins.
const KEYWORD_BUCKETS: &[(&str, &[&str])] = &[
    ("kläder", &["kläder", "jacka", "byxa", "handsk", "overall", "skydd", "hjälm", "väst"]),
    ("verktyg", &["verktyg", "borr", "slip", "såg", "hammare", "skruv"]),
    ("kyl", &["kyl", "frys"]),
    ("ugn", &["ugn", "spis", "häll"]),
    ("tvättmaskin", &["tvätt"]),
    ("torkskåp", &["tork"]),
    ("säkerhetsdörr", &["dörr", "lås"]),
];

/// Classify the top aggregates without any network call.
///
/// Pure and idempotent: the same aggregates and factor table always produce
/// the same result, which is what makes it a safe stand-in whenever the
/// external service misbehaves.
pub fn fallback_classify(
    aggregates: &[CategoryAggregate],
    factors: &FactorTable,
) -> ClassificationResult {
    let mut categories = Vec::new();
    let mut total_items = 0usize;

    for agg in aggregates.iter().take(MAX_CATEGORIES) {
        let factor = match_factor(&agg.name, factors);
        let co2 = agg.total_quantity * factor;
        total_items += agg.count;

        categories.push(ClassifiedCategory {
            name: agg.name.clone(),
            items: Vec::new(),
            totals: CategoryTotals {
                quantity: agg.total_quantity,
                emissions: BTreeMap::from([("co2".to_string(), co2)]),
                cost: agg.total_cost,
                energy: 0.0,
            },
        });
    }

    let total_co2: f64 = categories.iter().map(|c| c.emissions_sum()).sum();
    let recommendations = recommendations(categories.len(), total_co2);

    ClassificationResult {
        categories,
        summary: Summary {
            total_items: total_items as f64,
            ..Summary::default()
        },
        recommendations,
    }
    .normalize()
}

/// Factor lookup for one category name.
///
/// Order is fixed: direct substring match against every factor key in table
/// order, then the first qualifying keyword bucket, then the "övrigt" entry,
/// else zero.
fn match_factor(name: &str, factors: &FactorTable) -> f64 {
    let name = name.to_lowercase();

    for (key, factor) in factors.iter() {
        if name.contains(key) || key.contains(name.as_str()) {
            return factor;
        }
    }

    for (marker, needles) in KEYWORD_BUCKETS {
        for (key, factor) in factors.iter() {
            if key.contains(marker) && needles.iter().any(|n| name.contains(n)) {
                return factor;
            }
        }
    }

    factors.get(OTHER_CATEGORY).unwrap_or(0.0)
}

fn recommendations(category_count: usize, total_co2: f64) -> Vec<String> {
    let mut recs = vec![format!(
        "Analysen omfattar {category_count} kategorier med en uppskattad klimatpåverkan på totalt {total_co2:.0} kg CO2."
    )];

    if total_co2 > 0.0 {
        recs.push(
            "Fokusera på kategorierna med högst utsläpp, det är där ändrade inköpsval ger störst effekt.".to_string(),
        );
    } else {
        recs.push(
            "Komplettera klimatbladet med utsläppsfaktorer för fler kategorier så blir uppskattningen användbar.".to_string(),
        );
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(name: &str, cost: f64, quantity: f64) -> CategoryAggregate {
        CategoryAggregate {
            name: name.to_string(),
            total_cost: cost,
            total_quantity: quantity,
            count: 1,
        }
    }

    fn factors(entries: &[(&str, f64)]) -> FactorTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_direct_substring_match() {
        let table = factors(&[("kyl", 410.0), ("övrigt", 7.0)]);
        let result = fallback_classify(&[agg("Kylskåp", 10000.0, 5.0)], &table);

        let cat = &result.categories[0];
        assert_eq!(cat.emissions_sum(), 2050.0);
        assert_eq!(cat.totals.cost, 10000.0);
        assert_eq!(cat.totals.quantity, 5.0);
        assert_eq!(cat.totals.energy, 0.0);
        assert!(cat.items.is_empty());
    }

    #[test]
    fn test_unmatched_category_uses_other() {
        let table = factors(&[("kyl", 410.0), ("övrigt", 7.0)]);
        let result = fallback_classify(&[agg("Okänd pryl", 500.0, 3.0)], &table);
        assert_eq!(result.categories[0].emissions_sum(), 21.0);
    }

    #[test]
    fn test_no_other_entry_means_zero_factor() {
        let table = factors(&[("kyl", 410.0)]);
        let result = fallback_classify(&[agg("Okänd pryl", 500.0, 3.0)], &table);
        assert_eq!(result.categories[0].emissions_sum(), 0.0);
    }

    #[test]
    fn test_keyword_buckets_match_in_table_order() {
        // "Arbetsjacka" has no direct substring overlap with "skyddskläder",
        // but the kläder bucket links them.
        let table = factors(&[("skyddskläder", 25.0), ("övrigt", 7.0)]);
        let result = fallback_classify(&[agg("Arbetsjacka", 1200.0, 4.0)], &table);
        assert_eq!(result.categories[0].emissions_sum(), 100.0);
    }

    #[test]
    fn test_every_bucket_reaches_its_factor() {
        let cases = [
            ("kläder till lager", "Varselväst", 10.0),
            ("handverktyg", "Borrmaskin", 20.0),
            ("kyl och frysutrustning", "Frysbox", 30.0),
            ("ugnar", "Spishäll", 40.0),
            ("tvättmaskiner", "Tvättutrustning", 50.0),
            ("torkskåp", "Torktumlare", 60.0),
            ("säkerhetsdörrar", "Dörrparti", 70.0),
        ];

        for (factor_key, category, factor) in cases {
            let table = factors(&[(factor_key, factor), ("övrigt", 1.0)]);
            let result = fallback_classify(&[agg(category, 100.0, 1.0)], &table);
            assert_eq!(
                result.categories[0].emissions_sum(),
                factor,
                "{category} should reach {factor_key}"
            );
        }
    }

    #[test]
    fn test_direct_match_beats_buckets() {
        // Bucket matching would reach "kylar" first; the direct substring
        // pass over "kylskåp" runs before any bucket is consulted.
        let table = factors(&[("kylar", 99.0), ("kylskåp", 410.0)]);
        let result = fallback_classify(&[agg("Kylskåp", 100.0, 1.0)], &table);
        assert_eq!(result.categories[0].emissions_sum(), 410.0);
    }

    #[test]
    fn test_caps_at_ten_categories() {
        let aggs: Vec<CategoryAggregate> = (0..15)
            .map(|i| agg(&format!("Kategori {i}"), 100.0, 1.0))
            .collect();
        let table = factors(&[("övrigt", 2.0)]);

        let result = fallback_classify(&aggs, &table);
        assert_eq!(result.categories.len(), MAX_CATEGORIES);
        assert_eq!(result.summary.total_items, 10.0);
    }

    #[test]
    fn test_summary_sums_and_recommendations() {
        let table = factors(&[("kyl", 410.0), ("övrigt", 7.0)]);
        let result = fallback_classify(
            &[agg("Kylskåp", 10000.0, 5.0), agg("Okänd pryl", 500.0, 3.0)],
            &table,
        );

        assert_eq!(result.summary.total_cost, 10500.0);
        assert_eq!(result.summary.total_emissions.get("co2"), Some(&2071.0));
        assert_eq!(result.summary.total_energy, 0.0);
        assert_eq!(result.summary.total_items, 2.0);
        assert!(result.totals_consistent());

        assert_eq!(result.recommendations.len(), 2);
        assert!(result.recommendations[0].contains("2 kategorier"));
        assert!(result.recommendations[0].contains("2071 kg CO2"));
        assert!(result.recommendations[1].contains("högst utsläpp"));
    }

    #[test]
    fn test_zero_emissions_recommendation_branch() {
        let table = FactorTable::new();
        let result = fallback_classify(&[agg("Något", 100.0, 1.0)], &table);
        assert!(result.recommendations[1].contains("Komplettera klimatbladet"));
    }

    #[test]
    fn test_idempotent() {
        let table = factors(&[("kyl", 410.0), ("skyddskläder", 25.0), ("övrigt", 7.0)]);
        let aggs = vec![
            agg("Kylskåp", 10000.0, 5.0),
            agg("Arbetsjacka", 1200.0, 4.0),
            agg("Okänd pryl", 500.0, 3.0),
        ];

        assert_eq!(
            fallback_classify(&aggs, &table),
            fallback_classify(&aggs, &table)
        );
    }
}
