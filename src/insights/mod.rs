//! Aggregate views over a candidate set.
//!
//! These back summary displays (amount per year, top funders); the rendering
//! itself lives with the caller.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::dataset::Record;

/// Total awarded amount per year, ascending by year. Records without a
/// derived year are excluded.
pub fn amount_by_year(records: &[&Record]) -> BTreeMap<i32, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        if let Some(year) = record.year {
            *totals.entry(year).or_insert(0.0) += record.amount;
        }
    }
    totals
}

/// The `top` funders by total awarded amount, descending. Ties are broken by
/// funder name ascending for determinism.
pub fn top_funders(records: &[&Record], top: usize) -> Vec<(String, f64)> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.funder.as_str()).or_insert(0.0) += record.amount;
    }

    let mut ranked: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(funder, amount)| (funder.to_string(), amount))
        .collect();
    ranked.sort_by(|(name_a, amount_a), (name_b, amount_b)| {
        amount_b
            .total_cmp(amount_a)
            .then_with(|| name_a.cmp(name_b))
    });
    ranked.truncate(top);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn records() -> Dataset {
        let csv = "\
title,description,funder,amount,award_date
A,d,Green Trust,5000,2022-03-01
B,d,Care Foundation,3000,2021-07-15
C,d,Green Trust,7000,2022-11-30
D,d,Sport England,3000,,
";
        Dataset::load_reader(csv.as_bytes()).expect("load")
    }

    #[test]
    fn test_amount_by_year_sums_and_orders() {
        let dataset = records();
        let all: Vec<_> = dataset.records().iter().collect();
        let totals = amount_by_year(&all);

        let entries: Vec<(i32, f64)> = totals.into_iter().collect();
        // The undated record is excluded.
        assert_eq!(entries, vec![(2021, 3000.0), (2022, 12000.0)]);
    }

    #[test]
    fn test_top_funders_ranked_and_truncated() {
        let dataset = records();
        let all: Vec<_> = dataset.records().iter().collect();

        let ranked = top_funders(&all, 10);
        assert_eq!(ranked[0], ("Green Trust".to_string(), 12000.0));
        // Equal totals fall back to name order.
        assert_eq!(ranked[1], ("Care Foundation".to_string(), 3000.0));
        assert_eq!(ranked[2], ("Sport England".to_string(), 3000.0));

        assert_eq!(top_funders(&all, 1).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(amount_by_year(&[]).is_empty());
        assert!(top_funders(&[], 5).is_empty());
    }
}
