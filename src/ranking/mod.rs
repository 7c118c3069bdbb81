//! Ranking pipelines
//!
//! Three pipelines turn rows into a leaderboard:
//! - Standard: filter, group, aggregate, sort, optional top-N
//! - MixedRanks: several categories, per-entity subtraction operations
//! - SingleRank: one category and a manual allow-list of entities
//!
//! All of them finish with [`rank_rows`], so ordering and rank assignment
//! are identical across modes.

pub mod mixed_ranks;
pub mod single_rank;
pub mod standard;

use std::cmp::Ordering;

use crate::types::{RankingRow, SortOrder};

pub use mixed_ranks::compute_mixed_ranks;
pub use single_rank::compute_single_rank;
pub use standard::compute_standard;

/// Stable sort by value, optional truncation, then dense 1-based ranks.
///
/// Equal values keep their construction order. `top_n` of `None` or `0`
/// keeps every row.
pub fn rank_rows(mut rows: Vec<RankingRow>, order: SortOrder, top_n: Option<usize>) -> Vec<RankingRow> {
    trace_stage!("sort");
    // `sort_by` is stable: ties stay in insertion order.
    rows.sort_by(|a, b| {
        let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    if let Some(n) = top_n.filter(|&n| n > 0) {
        rows.truncate(n);
    }

    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Details;

    fn entry(name: &str, value: f64) -> RankingRow {
        RankingRow::unranked(name, None, value, Details::new())
    }

    fn names(rows: &[RankingRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_desc_and_asc() {
        let rows = vec![entry("a", 1.0), entry("b", 3.0), entry("c", 2.0)];
        let desc = rank_rows(rows.clone(), SortOrder::Desc, None);
        assert_eq!(names(&desc), vec!["b", "c", "a"]);
        let asc = rank_rows(rows, SortOrder::Asc, None);
        assert_eq!(names(&asc), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let rows = vec![entry("first", 5.0), entry("x", 9.0), entry("second", 5.0)];
        let desc = rank_rows(rows.clone(), SortOrder::Desc, None);
        assert_eq!(names(&desc), vec!["x", "first", "second"]);
        let asc = rank_rows(rows, SortOrder::Asc, None);
        assert_eq!(names(&asc), vec!["first", "second", "x"]);
    }

    #[test]
    fn test_dense_ranks_after_truncation() {
        let rows = (0..10).map(|i| entry(&format!("e{i}"), i as f64)).collect();
        let ranked = rank_rows(rows, SortOrder::Desc, Some(3));
        assert_eq!(ranked.len(), 3);
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(ranked[0].value, 9.0);
    }

    #[test]
    fn test_zero_top_n_keeps_everything() {
        let rows = vec![entry("a", 1.0), entry("b", 2.0)];
        assert_eq!(rank_rows(rows, SortOrder::Desc, Some(0)).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_rows(Vec::new(), SortOrder::Desc, Some(5)).is_empty());
    }
}
