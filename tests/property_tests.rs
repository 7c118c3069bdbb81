//! Property-based tests using proptest

use proptest::prelude::*;
use rapid_ranklist::indicator::{MixedRanksConfig, SpecialOperation, StandardConfig};
use rapid_ranklist::*;

const CATEGORIES: [&str; 4] = ["CN", "CD", "FC", "EX"];

/// Rows with unique ids, names drawn from a small pool so groups merge.
fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((0usize..12, 0usize..4, 0u32..500), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (person, cat, units))| {
                let name = format!("P{person}");
                Row::new(
                    format!("id{i}"),
                    Some(name.as_str()),
                    None,
                    Some(CATEGORIES[cat]),
                )
                .with_units(f64::from(units), 0.0, 0.0)
            })
            .collect()
    })
}

/// Same rows, one distinct name per id.
fn unique_rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    rows_strategy().prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.full_name = Some(format!("U{i}"));
                row
            })
            .collect()
    })
}

fn aggregation_strategy() -> impl Strategy<Value = Aggregation> {
    prop::sample::select(Aggregation::ALL.to_vec())
}

fn order_strategy() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]
}

fn standard(aggregation: Aggregation, top_n: Option<usize>) -> StandardConfig {
    StandardConfig {
        group_by: GroupBy::Collaborator,
        aggregation,
        filters: None,
        top_n,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_ranks_are_dense_from_one(
        rows in rows_strategy(),
        aggregation in aggregation_strategy(),
        order in order_strategy()
    ) {
        let ranked = compute_standard(&rows, &standard(aggregation, None), "totalUnits", order);

        for (i, row) in ranked.iter().enumerate() {
            prop_assert_eq!(row.rank, i + 1);
        }
    }

    #[test]
    fn test_values_follow_sort_order(
        rows in rows_strategy(),
        aggregation in aggregation_strategy(),
        order in order_strategy()
    ) {
        let ranked = compute_standard(&rows, &standard(aggregation, None), "totalUnits", order);

        for pair in ranked.windows(2) {
            match order {
                SortOrder::Desc => prop_assert!(pair[0].value >= pair[1].value),
                SortOrder::Asc => prop_assert!(pair[0].value <= pair[1].value),
            }
        }
    }

    #[test]
    fn test_top_n_is_a_prefix(
        rows in rows_strategy(),
        top_n in 1usize..15
    ) {
        let full = compute_standard(&rows, &standard(Aggregation::Sum, None), "totalUnits", SortOrder::Desc);
        let capped = compute_standard(&rows, &standard(Aggregation::Sum, Some(top_n)), "totalUnits", SortOrder::Desc);

        prop_assert_eq!(capped.len(), full.len().min(top_n));
        prop_assert_eq!(&capped[..], &full[..capped.len()]);
    }

    #[test]
    fn test_sum_groups_preserve_the_total(rows in rows_strategy()) {
        let ranked = compute_standard(&rows, &standard(Aggregation::Sum, None), "totalUnits", SortOrder::Desc);

        let grouped: f64 = ranked.iter().map(|r| r.value).sum();
        let total: f64 = rows.iter().map(|r| r.total_units).sum();
        prop_assert!((grouped - total).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_ranks_only_selected_categories(
        rows in rows_strategy(),
        picks in prop::sample::subsequence(CATEGORIES.to_vec(), 1..=4)
    ) {
        let config = MixedRanksConfig {
            selected_ranks: picks.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        };
        let ranked = compute_mixed_ranks(&rows, &config, "totalUnits", SortOrder::Desc);

        let expected = rows
            .iter()
            .filter(|r| {
                let category = r.rank_category.as_deref().unwrap_or("");
                picks.iter().any(|c| *c == category)
            })
            .count();
        prop_assert_eq!(ranked.len(), expected);
        for row in &ranked {
            let category = row.rank_category.as_deref().unwrap_or("");
            prop_assert!(picks.iter().any(|c| *c == category));
        }
    }

    #[test]
    fn test_special_operations_read_base_values(
        rows in unique_rows_strategy().prop_filter("need two rows", |r| r.len() >= 2)
    ) {
        let config = MixedRanksConfig {
            selected_ranks: CATEGORIES.iter().map(|c| c.to_string()).collect(),
            special_operations: vec![
                SpecialOperation::new("id0", vec!["id1".into()]),
                SpecialOperation::new("id1", vec!["id0".into()]),
            ],
            ..Default::default()
        };
        let ranked = compute_mixed_ranks(&rows, &config, "totalUnits", SortOrder::Desc);

        let a = rows[0].total_units;
        let b = rows[1].total_units;
        let value = |name: &str| ranked.iter().find(|r| r.name == name).map(|r| r.value);
        prop_assert_eq!(ranked.len(), rows.len());
        prop_assert_eq!(value(&rows[0].display_name()), Some(a - b));
        prop_assert_eq!(value(&rows[1].display_name()), Some(b - a));
        for (i, row) in rows.iter().enumerate().skip(2) {
            prop_assert_eq!(value(&row.display_name()), Some(row.total_units), "row {}", i);
        }
    }

    #[test]
    fn test_validation_never_mutates(rows in rows_strategy()) {
        let record: IndicatorRecord = serde_json::from_value(serde_json::json!({
            "rankingMode": "mixedRanks",
            "groupBy": "collaborator",
            "metricField": "totalUnits",
            "selectedRanks": "[\"CN\",\"FA\"]",
            "includedCollaboratorIds": ["id0"]
        })).unwrap();
        let before = record.clone();
        let rows_before = rows.clone();

        let _ = RankingEngine::default().compute(&record, &rows);

        prop_assert_eq!(record, before);
        prop_assert_eq!(rows, rows_before);
    }
}
