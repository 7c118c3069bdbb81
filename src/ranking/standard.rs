//! Standard ranking
//!
//! Filter the rows, group them along one dimension, reduce the metric per
//! group and rank the groups. This is the only mode that honours `filters`,
//! `aggregation` and `topN`.

use crate::aggregate::group_and_aggregate;
use crate::filter::apply_filters;
use crate::indicator::spec::StandardConfig;
use crate::ranking::rank_rows;
use crate::types::{RankingRow, Row, SortOrder};

/// Compute a standard leaderboard.
pub fn compute_standard(
    rows: &[Row],
    config: &StandardConfig,
    metric_field: &str,
    sort_order: SortOrder,
) -> Vec<RankingRow> {
    let filtered = apply_filters(rows, config.filters.as_ref());
    let groups = group_and_aggregate(filtered, &config.group_by, metric_field, config.aggregation);

    let entries = groups
        .into_iter()
        .map(|(name, group)| {
            let category = group.category();
            RankingRow::unranked(name, category, group.value, group.details)
        })
        .collect();

    rank_rows(entries, sort_order, config.top_n)
}
