//! Typed indicator specification.
//!
//! An [`IndicatorSpec`] is what the pipelines consume: the ranking mode is a
//! tagged variant carrying only the fields that mode uses. The flat record
//! shape stored by the persistence layer lives in
//! [`super::record::IndicatorRecord`], which converts to and from this type.

use serde::{Deserialize, Serialize};

use crate::filter::FilterSet;
use crate::types::{Aggregation, GroupBy, SortOrder};

/// Whether an indicator ships with the application or was defined by an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Seeded at startup; never edited or deleted.
    Predefined,
    #[default]
    Custom,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Predefined => "predefined",
            IndicatorKind::Custom => "custom",
        }
    }
}

/// Name of a ranking mode as stored in `rankingMode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "mixedRanks")]
    MixedRanks,
    #[serde(rename = "singleRankSelection")]
    SingleRankSelection,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [
        ModeKind::Standard,
        ModeKind::MixedRanks,
        ModeKind::SingleRankSelection,
    ];

    /// Parse a stored mode name, `None` when unknown.
    pub fn parse_known(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Standard => "standard",
            ModeKind::MixedRanks => "mixedRanks",
            ModeKind::SingleRankSelection => "singleRankSelection",
        }
    }

    /// Modes that rank individual collaborators picked by category.
    pub fn uses_selection(&self) -> bool {
        matches!(self, ModeKind::MixedRanks | ModeKind::SingleRankSelection)
    }
}

/// Subtract the base values of `subtract_collaborator_ids` from the target's
/// base value.
///
/// The display names are stored by the selection UI and ignored by the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialOperation {
    #[serde(alias = "targetId")]
    pub target_collaborator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_collaborator_name: Option<String>,
    #[serde(default, alias = "subtractIds")]
    pub subtract_collaborator_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtract_collaborator_names: Option<Vec<String>>,
}

impl SpecialOperation {
    pub fn new(target: impl Into<String>, subtract: Vec<String>) -> Self {
        Self {
            target_collaborator_id: target.into(),
            subtract_collaborator_ids: subtract,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardConfig {
    pub group_by: GroupBy,
    pub aggregation: Aggregation,
    pub filters: Option<FilterSet>,
    /// Positive cap on the result size; `None` keeps every group.
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixedRanksConfig {
    /// Category labels whose collaborators take part. Order is irrelevant.
    pub selected_ranks: Vec<String>,
    pub special_operations: Vec<SpecialOperation>,
    /// Allow-list; when non-empty, `excluded_ids` is ignored.
    pub included_ids: Option<Vec<String>>,
    pub excluded_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleRankConfig {
    pub category: String,
    pub included_ids: Vec<String>,
}

/// The ranking mode with its mode-specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum RankingMode {
    Standard(StandardConfig),
    MixedRanks(MixedRanksConfig),
    SingleRank(SingleRankConfig),
}

impl RankingMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            RankingMode::Standard(_) => ModeKind::Standard,
            RankingMode::MixedRanks(_) => ModeKind::MixedRanks,
            RankingMode::SingleRank(_) => ModeKind::SingleRankSelection,
        }
    }
}

/// A fully decoded indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub name: String,
    pub description: Option<String>,
    pub kind: IndicatorKind,
    /// Required for every mode; only the standard pipeline groups by it.
    pub group_by: GroupBy,
    pub metric_field: String,
    pub sort_order: SortOrder,
    pub mode: RankingMode,
}

impl IndicatorSpec {
    /// A custom standard-mode indicator summing `metric_field`, descending.
    pub fn standard(name: impl Into<String>, group_by: GroupBy, metric_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: IndicatorKind::Custom,
            group_by: group_by.clone(),
            metric_field: metric_field.into(),
            sort_order: SortOrder::Desc,
            mode: RankingMode::Standard(StandardConfig {
                group_by,
                aggregation: Aggregation::Sum,
                filters: None,
                top_n: None,
            }),
        }
    }

    pub fn with_mode(mut self, mode: RankingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Aggregation reported in results: the standard config's, else `sum`.
    pub fn aggregation(&self) -> Aggregation {
        match &self.mode {
            RankingMode::Standard(config) => config.aggregation,
            _ => Aggregation::Sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_special_operation_accepts_short_aliases() {
        let op: SpecialOperation =
            serde_json::from_value(json!({ "targetId": "a", "subtractIds": ["b"] })).unwrap();
        assert_eq!(op, SpecialOperation::new("a", vec!["b".into()]));

        let op: SpecialOperation = serde_json::from_value(json!({
            "targetCollaboratorId": "a",
            "targetCollaboratorName": "Ada",
            "subtractCollaboratorIds": ["b", "c"]
        }))
        .unwrap();
        assert_eq!(op.subtract_collaborator_ids.len(), 2);
        assert_eq!(op.target_collaborator_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_mode_kind_names() {
        assert_eq!(ModeKind::parse_known("mixedRanks"), Some(ModeKind::MixedRanks));
        assert_eq!(ModeKind::parse_known("mixed_ranks"), None);
        assert_eq!(
            serde_json::to_value(ModeKind::SingleRankSelection).unwrap(),
            "singleRankSelection"
        );
        assert!(!ModeKind::Standard.uses_selection());
    }

    #[test]
    fn test_standard_builder() {
        let spec = IndicatorSpec::standard("Top", GroupBy::Coach, "totalUnits")
            .with_sort_order(SortOrder::Asc);
        assert_eq!(spec.mode.kind(), ModeKind::Standard);
        assert_eq!(spec.aggregation(), Aggregation::Sum);
        assert_eq!(spec.sort_order, SortOrder::Asc);
    }
}
