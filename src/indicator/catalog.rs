//! In-memory indicator catalog.
//!
//! Reference implementation of the indicator store: the predefined
//! indicators are seeded through an idempotent upsert keyed by
//! `(name, kind)`, operators create, edit, duplicate and delete custom
//! indicators, and predefined ones are read-only.

use std::cmp::Reverse;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::IndicatorRecord;
use super::spec::{IndicatorKind, ModeKind};
use crate::errors::{RanklistError, Result};
use crate::types::{Aggregation, GroupBy, SortOrder};

/// Fields accepted when creating a custom indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorDraft {
    pub name: String,
    pub description: Option<String>,
    pub ranking_mode: Option<String>,
    pub group_by: Option<String>,
    pub metric_field: Option<String>,
    pub aggregation: Option<String>,
    pub filters: Option<Value>,
    pub sort_order: Option<String>,
    pub top_n: Option<i64>,
    pub selected_ranks: Option<Value>,
    pub special_operations: Option<Value>,
    pub included_collaborator_ids: Option<Value>,
    pub excluded_collaborator_ids: Option<Value>,
}

impl IndicatorDraft {
    pub fn new(name: impl Into<String>, group_by: &str, metric_field: &str) -> Self {
        Self {
            name: name.into(),
            group_by: Some(group_by.to_string()),
            metric_field: Some(metric_field.to_string()),
            ..Default::default()
        }
    }
}

/// Partial update of a custom indicator; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_by: Option<String>,
    pub metric_field: Option<String>,
    pub aggregation: Option<String>,
    pub filters: Option<Value>,
    pub sort_order: Option<String>,
    pub top_n: Option<i64>,
}

fn predefined(name: &str, description: &str, group_by: GroupBy, metric_field: &str) -> IndicatorRecord {
    IndicatorRecord {
        name: name.to_string(),
        description: Some(description.to_string()),
        kind: IndicatorKind::Predefined,
        ranking_mode: Some(ModeKind::Standard.as_str().to_string()),
        group_by: Some(group_by.as_str().to_string()),
        metric_field: Some(metric_field.to_string()),
        aggregation: Some(Aggregation::Sum.as_str().to_string()),
        sort_order: Some(SortOrder::Desc.as_str().to_string()),
        is_active: Some(true),
        ..Default::default()
    }
}

/// The indicators every installation starts with.
pub fn predefined_indicators() -> Vec<IndicatorRecord> {
    vec![
        predefined(
            "Top collaborateurs – Unités perso (brut)",
            "Classement des collaborateurs par unités brutes personnelles",
            GroupBy::Collaborator,
            "unitsBrutPersonal",
        ),
        predefined(
            "Top collaborateurs – Unités globales (brut)",
            "Classement des collaborateurs par unités brutes globales",
            GroupBy::Collaborator,
            "unitsBrutGlobal",
        ),
        predefined(
            "Top collaborateurs – Unités totales (perso + global + parallèles)",
            "Classement des collaborateurs par total des unités brutes",
            GroupBy::Collaborator,
            "totalUnits",
        ),
        predefined(
            "Top coachs – Unités totales",
            "Classement des coachs par unités totales de leurs collaborateurs",
            GroupBy::Coach,
            "totalUnits",
        ),
        predefined(
            "Top catégories de rang – Unités totales",
            "Classement des catégories de rang par unités totales",
            GroupBy::RankCategory,
            "totalUnits",
        ),
    ]
}

/// Indicators keyed by id, in creation order.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCatalog {
    entries: IndexMap<String, IndicatorRecord>,
    next_id: u64,
}

impl IndicatorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog already holding the predefined indicators.
    pub fn seeded() -> Self {
        let mut catalog = Self::new();
        catalog.seed_predefined();
        catalog
    }

    fn insert(&mut self, mut record: IndicatorRecord) -> &IndicatorRecord {
        self.next_id += 1;
        let id = format!("ind-{}", self.next_id);
        record.id = id.clone();
        self.entries.entry(id).or_insert(record)
    }

    fn custom_mut(&mut self, id: &str, action: &str) -> Result<&mut IndicatorRecord> {
        let record = self
            .entries
            .get_mut(id)
            .ok_or_else(|| RanklistError::indicator_not_found(id))?;
        if record.kind == IndicatorKind::Predefined {
            return Err(RanklistError::predefined_immutable(action, record.name.as_str()));
        }
        Ok(record)
    }

    /// Insert every predefined indicator not already present, matched by
    /// name among predefined entries. Returns how many were inserted.
    pub fn seed_predefined(&mut self) -> usize {
        let mut inserted = 0;
        for record in predefined_indicators() {
            let exists = self
                .entries
                .values()
                .any(|e| e.kind == IndicatorKind::Predefined && e.name == record.name);
            if !exists {
                self.insert(record);
                inserted += 1;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(inserted, total = self.entries.len(), "seeded predefined indicators");
        inserted
    }

    /// Create a custom indicator, applying the stored defaults.
    pub fn create(&mut self, draft: IndicatorDraft) -> Result<&IndicatorRecord> {
        let non_empty = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if draft.name.is_empty() || !non_empty(&draft.group_by) || !non_empty(&draft.metric_field) {
            return Err(RanklistError::invalid_config(
                "Missing required fields: name, groupBy, metricField",
            ));
        }

        let group_by = draft.group_by.unwrap_or_default();
        if !GroupBy::KNOWN.iter().any(|k| *k == group_by) {
            return Err(RanklistError::invalid_config(format!(
                "Invalid groupBy. Must be one of: {}",
                GroupBy::KNOWN.join(", ")
            )));
        }

        if let Some(aggregation) = draft.aggregation.as_deref() {
            if !aggregation.is_empty() && Aggregation::parse_known(aggregation).is_none() {
                return Err(RanklistError::invalid_config(format!(
                    "Invalid aggregation. Must be one of: {}",
                    Aggregation::ALL.map(|a| a.as_str()).join(", ")
                )));
            }
        }

        let or_default = |v: Option<String>, default: &str| {
            v.filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
        };
        let record = IndicatorRecord {
            name: draft.name,
            description: draft.description,
            kind: IndicatorKind::Custom,
            ranking_mode: Some(or_default(draft.ranking_mode, ModeKind::Standard.as_str())),
            group_by: Some(group_by),
            metric_field: draft.metric_field,
            aggregation: Some(or_default(draft.aggregation, Aggregation::Sum.as_str())),
            filters: draft.filters,
            sort_order: Some(or_default(draft.sort_order, SortOrder::Desc.as_str())),
            top_n: draft.top_n.filter(|&n| n != 0),
            selected_ranks: draft.selected_ranks,
            special_operations: draft.special_operations,
            included_collaborator_ids: draft.included_collaborator_ids,
            excluded_collaborator_ids: draft.excluded_collaborator_ids,
            is_active: Some(true),
            ..Default::default()
        };
        Ok(self.insert(record))
    }

    /// Change the provided fields of a custom indicator.
    pub fn update(&mut self, id: &str, patch: IndicatorPatch) -> Result<&IndicatorRecord> {
        let record = self.custom_mut(id, "modify")?;
        let keep_or = |current: &mut Option<String>, new: Option<String>| {
            if let Some(value) = new.filter(|v| !v.is_empty()) {
                *current = Some(value);
            }
        };

        if let Some(name) = patch.name.filter(|n| !n.is_empty()) {
            record.name = name;
        }
        if patch.description.is_some() {
            record.description = patch.description;
        }
        keep_or(&mut record.group_by, patch.group_by);
        keep_or(&mut record.metric_field, patch.metric_field);
        keep_or(&mut record.aggregation, patch.aggregation);
        keep_or(&mut record.sort_order, patch.sort_order);
        if patch.filters.is_some() {
            record.filters = patch.filters;
        }
        if patch.top_n.is_some() {
            record.top_n = patch.top_n;
        }
        Ok(&*record)
    }

    /// Remove a custom indicator.
    pub fn delete(&mut self, id: &str) -> Result<IndicatorRecord> {
        self.custom_mut(id, "delete")?;
        self.entries
            .shift_remove(id)
            .ok_or_else(|| RanklistError::indicator_not_found(id))
    }

    /// Copy any indicator as a new custom one named `"<name> (copie)"`.
    pub fn duplicate(&mut self, id: &str) -> Result<&IndicatorRecord> {
        let original = self
            .entries
            .get(id)
            .ok_or_else(|| RanklistError::indicator_not_found(id))?;
        let copy = IndicatorRecord {
            id: String::new(),
            name: format!("{} (copie)", original.name),
            kind: IndicatorKind::Custom,
            is_active: Some(true),
            created_at: None,
            updated_at: None,
            ..original.clone()
        };
        Ok(self.insert(copy))
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorRecord> {
        self.entries.get(id)
    }

    /// Active indicators: predefined first, then newest first.
    pub fn list(&self) -> Vec<&IndicatorRecord> {
        let mut active: Vec<(usize, &IndicatorRecord)> = self
            .entries
            .values()
            .enumerate()
            .filter(|(_, r)| r.is_active())
            .collect();
        active.sort_by_key(|(index, r)| (r.kind != IndicatorKind::Predefined, Reverse(*index)));
        active.into_iter().map(|(_, r)| r).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
