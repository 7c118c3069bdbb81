//! MixedRanks ranking
//!
//! Ranks individual collaborators drawn from several categories at once and
//! lets the operator adjust individual scores: a special operation subtracts
//! the *base* values of a list of collaborators from a target's base value.
//!
//! Adjustments never read another entity's adjusted value, so the order of
//! the operation list only matters when two operations share a target (the
//! last one wins; the validator rejects such configurations).

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::indicator::spec::{MixedRanksConfig, SpecialOperation};
use crate::ranking::rank_rows;
use crate::types::{Details, RankingRow, Row, SortOrder};

/// One collaborator after category and id filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    /// Metric before any special operation.
    pub base_value: f64,
    /// Metric used for sorting.
    pub final_value: f64,
    /// Ids whose base value was subtracted, when this entity was a target.
    pub subtracted: Vec<String>,
    pub details: Details,
}

impl Entity {
    fn from_row(row: &Row, metric_field: &str) -> Self {
        let base_value = row.metric(metric_field);
        Self {
            id: row.id.clone(),
            name: row.display_name(),
            category: row.category().map(str::to_string),
            base_value,
            final_value: base_value,
            subtracted: Vec::new(),
            details: row.collaborator_details(),
        }
    }

    fn into_ranking_row(mut self) -> RankingRow {
        self.details.insert("baseValue".into(), number(self.base_value));
        if !self.subtracted.is_empty() {
            self.details.insert(
                "subtractedIds".into(),
                Value::Array(self.subtracted.into_iter().map(Value::String).collect()),
            );
        }
        RankingRow::unranked(self.name, self.category, self.final_value, self.details)
    }
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Entities keyed by id, in first-seen order.
pub type Entities = IndexMap<String, Entity>;

/// Select rows by category and id lists and build one entity per id.
///
/// A non-empty `included_ids` wins over `excluded_ids`. The first row seen
/// for an id defines the entity; later duplicates are ignored.
pub fn collect_entities(rows: &[Row], config: &MixedRanksConfig, metric_field: &str) -> Entities {
    trace_stage!("filter");
    let ranks: FxHashSet<&str> = config.selected_ranks.iter().map(String::as_str).collect();
    let included: FxHashSet<&str> = id_set(config.included_ids.as_deref());
    let excluded: FxHashSet<&str> = id_set(config.excluded_ids.as_deref());

    let mut entities = Entities::default();
    for row in rows {
        if !row.category().is_some_and(|c| ranks.contains(c)) {
            continue;
        }
        let id = row.id.as_str();
        if !included.is_empty() {
            if !included.contains(id) {
                continue;
            }
        } else if excluded.contains(id) {
            continue;
        }
        entities
            .entry(row.id.clone())
            .or_insert_with(|| Entity::from_row(row, metric_field));
    }
    entities
}

fn id_set(ids: Option<&[String]>) -> FxHashSet<&str> {
    ids.unwrap_or_default().iter().map(String::as_str).collect()
}

/// Apply special operations in list order.
///
/// A missing target skips the operation. Unknown subtract ids contribute 0.
pub fn apply_special_operations(entities: &mut Entities, operations: &[SpecialOperation]) {
    trace_stage!("adjust");
    for op in operations {
        let Some(target) = entities.get(&op.target_collaborator_id) else {
            continue;
        };
        let base = target.base_value;

        let mut subtract_sum = 0.0;
        let mut resolved = Vec::new();
        for id in &op.subtract_collaborator_ids {
            if let Some(source) = entities.get(id) {
                subtract_sum += source.base_value;
                resolved.push(id.clone());
            }
        }

        if let Some(target) = entities.get_mut(&op.target_collaborator_id) {
            target.final_value = base - subtract_sum;
            target.subtracted = resolved;
        }
    }
}

/// Compute a mixed-ranks leaderboard.
pub fn compute_mixed_ranks(
    rows: &[Row],
    config: &MixedRanksConfig,
    metric_field: &str,
    sort_order: SortOrder,
) -> Vec<RankingRow> {
    let mut entities = collect_entities(rows, config, metric_field);
    apply_special_operations(&mut entities, &config.special_operations);

    let entries = entities
        .into_values()
        .map(Entity::into_ranking_row)
        .collect();
    rank_rows(entries, sort_order, None)
}
