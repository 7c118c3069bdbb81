//! Dataset statistics and collaborator listing.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::aggregate::group_and_aggregate;
use crate::types::{Aggregation, GroupBy, Row};

/// Number of coaches kept in [`DatasetStats::top_coaches`].
pub const TOP_COACHES: usize = 10;

/// A coach and the total units of the rows they supervise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachTotal {
    pub name: String,
    pub total_units: f64,
}

/// Summary figures for one uploaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_rows: usize,
    pub total_units_brut_personal: f64,
    pub total_units_brut_global: f64,
    pub total_units_brut_parallel: f64,
    pub total_units: f64,
    /// Mean `totalUnits` per row, 0 for an empty dataset.
    pub avg_units_per_collaborator: f64,
    pub unique_rank_categories: usize,
    pub unique_coaches: usize,
    /// Total units per category, in first-seen order.
    pub rank_category_breakdown: IndexMap<String, f64>,
    pub top_coaches: Vec<CoachTotal>,
}

impl DatasetStats {
    pub fn compute(rows: &[Row]) -> Self {
        let sum = |f: fn(&Row) -> f64| rows.iter().map(f).sum::<f64>();
        let total_units = sum(|r| r.total_units);

        let rank_category_breakdown: IndexMap<String, f64> =
            group_and_aggregate(rows, &GroupBy::RankCategory, "totalUnits", Aggregation::Sum)
                .into_iter()
                .map(|(key, group)| (key, group.value))
                .collect();

        let coaches = group_and_aggregate(rows, &GroupBy::Coach, "totalUnits", Aggregation::Sum);
        let unique_coaches = coaches.len();
        let mut top_coaches: Vec<CoachTotal> = coaches
            .into_iter()
            .map(|(name, group)| CoachTotal {
                name,
                total_units: group.value,
            })
            .collect();
        top_coaches.sort_by(|a, b| b.total_units.total_cmp(&a.total_units));
        top_coaches.truncate(TOP_COACHES);

        Self {
            total_rows: rows.len(),
            total_units_brut_personal: sum(|r| r.units_brut_personal),
            total_units_brut_global: sum(|r| r.units_brut_global),
            total_units_brut_parallel: sum(|r| r.units_brut_parallel),
            total_units,
            avg_units_per_collaborator: if rows.is_empty() {
                0.0
            } else {
                total_units / rows.len() as f64
            },
            unique_rank_categories: rank_category_breakdown.len(),
            unique_coaches,
            rank_category_breakdown,
            top_coaches,
        }
    }
}

/// Distinct non-empty categories, sorted.
pub fn available_categories(rows: &[Row]) -> Vec<&str> {
    let mut seen = FxHashSet::default();
    let mut categories: Vec<&str> = rows
        .iter()
        .filter_map(Row::category)
        .filter(|c| seen.insert(*c))
        .collect();
    categories.sort_unstable();
    categories
}

/// Rows matching an optional category and an optional name search.
///
/// The search is a case-insensitive substring match on first, last or full
/// name. Results are ordered by category, last name, first name.
pub fn list_collaborators<'a>(
    rows: &'a [Row],
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Row> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let contains = |value: &Option<String>, needle: &str| {
        value
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(needle))
    };

    let mut out: Vec<&Row> = rows
        .iter()
        .filter(|r| category.map_or(true, |c| r.rank_category.as_deref() == Some(c)))
        .filter(|r| match needle.as_deref() {
            None => true,
            Some(n) => {
                contains(&r.first_name, n) || contains(&r.last_name, n) || contains(&r.full_name, n)
            }
        })
        .collect();
    out.sort_by(|a, b| {
        (&a.rank_category, &a.last_name, &a.first_name).cmp(&(
            &b.rank_category,
            &b.last_name,
            &b.first_name,
        ))
    });
    out
}
