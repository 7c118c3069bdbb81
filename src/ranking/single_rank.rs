//! SingleRank manual selection
//!
//! One category, an explicit allow-list of collaborator ids, one entry per
//! id. No grouping, no filters, no adjustments.

use rustc_hash::FxHashSet;

use crate::indicator::spec::SingleRankConfig;
use crate::ranking::rank_rows;
use crate::types::{RankingRow, Row, SortOrder};

/// Compute a single-rank leaderboard.
pub fn compute_single_rank(
    rows: &[Row],
    config: &SingleRankConfig,
    metric_field: &str,
    sort_order: SortOrder,
) -> Vec<RankingRow> {
    trace_stage!("filter");
    let allowed: FxHashSet<&str> = config.included_ids.iter().map(String::as_str).collect();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    let entries = rows
        .iter()
        .filter(|row| row.category() == Some(config.category.as_str()))
        .filter(|row| allowed.contains(row.id.as_str()))
        .filter(|row| seen.insert(row.id.as_str()))
        .map(|row| {
            RankingRow::unranked(
                row.display_name(),
                row.category().map(str::to_string),
                row.metric(metric_field),
                row.collaborator_details(),
            )
        })
        .collect();

    rank_rows(entries, sort_order, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, cat: &str, total: f64) -> Row {
        let mut row = Row::new(id, Some(id), None, Some(cat));
        row.total_units = total;
        row
    }

    fn config(category: &str, ids: &[&str]) -> SingleRankConfig {
        SingleRankConfig {
            category: category.to_string(),
            included_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_category_and_allow_list() {
        let rows = vec![
            row("a", "CN", 5.0),
            row("b", "CN", 9.0),
            row("c", "CD", 50.0),
            row("d", "CN", 7.0),
        ];
        let ranked = compute_single_rank(&rows, &config("CN", &["a", "b", "c"]), "totalUnits", SortOrder::Desc);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let rows = vec![row("a", "CN", 1.0), row("a", "CN", 100.0)];
        let ranked = compute_single_rank(&rows, &config("CN", &["a"]), "totalUnits", SortOrder::Desc);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].value, 1.0);
    }

    #[test]
    fn test_stale_ids_give_empty_ranking() {
        let rows = vec![row("new-1", "CN", 1.0)];
        let ranked = compute_single_rank(&rows, &config("CN", &["old-1"]), "totalUnits", SortOrder::Desc);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ascending() {
        let rows = vec![row("a", "CN", 3.0), row("b", "CN", 1.0)];
        let ranked = compute_single_rank(&rows, &config("CN", &["a", "b"]), "totalUnits", SortOrder::Asc);
        assert_eq!(ranked[0].name, "b");
    }
}
