//! Flat indicator record, as stored by the persistence layer.
//!
//! The record predates the ranking modes: every mode shares one flat shape
//! and the list fields (`selectedRanks`, `specialOperations`,
//! `includedCollaboratorIds`, `excludedCollaboratorIds`) and `filters` may be
//! stored either as JSON values or as JSON-encoded strings. This module is
//! the only place that knows about that shape; [`IndicatorRecord::to_spec`]
//! turns it into a typed [`IndicatorSpec`] and
//! [`IndicatorRecord::from_spec`] goes the other way.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "id": "ind-42",
//!   "name": "Top CN + CD",
//!   "type": "custom",
//!   "rankingMode": "mixedRanks",
//!   "groupBy": "collaborator",
//!   "metricField": "totalUnits",
//!   "aggregation": "sum",
//!   "sortOrder": "desc",
//!   "selectedRanks": "[\"CN\",\"CD\"]",
//!   "specialOperations": [{ "targetCollaboratorId": "r1", "subtractCollaboratorIds": ["r2"] }],
//!   "includedCollaboratorIds": ["r1", "r2", "r3"]
//! }
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::error_code::ErrorCode;
use super::errors::ConfigError;
use super::spec::{
    IndicatorKind, IndicatorSpec, MixedRanksConfig, ModeKind, RankingMode, SingleRankConfig,
    SpecialOperation, StandardConfig,
};
use crate::errors::{RanklistError, Result};
use crate::filter::FilterSet;
use crate::types::{Aggregation, GroupBy, SortOrder};

/// Hint attached to configuration errors that only a new indicator can fix.
pub const REPAIR_HINT: &str = "Dupliquez cet indicateur pour le reconfigurer.";

/// An indicator definition in its stored, flat form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: IndicatorKind,

    /// Absent means `standard`.
    #[serde(default)]
    pub ranking_mode: Option<String>,

    #[serde(default)]
    pub group_by: Option<String>,

    #[serde(default)]
    pub metric_field: Option<String>,

    #[serde(default)]
    pub aggregation: Option<String>,

    #[serde(default)]
    pub filters: Option<Value>,

    #[serde(default)]
    pub sort_order: Option<String>,

    #[serde(default)]
    pub top_n: Option<i64>,

    #[serde(default)]
    pub selected_ranks: Option<Value>,

    #[serde(default)]
    pub special_operations: Option<Value>,

    #[serde(default)]
    pub included_collaborator_ids: Option<Value>,

    #[serde(default)]
    pub excluded_collaborator_ids: Option<Value>,

    /// Absent means active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    /// Timestamps owned by the persistence layer, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, Value>,
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Outcome of decoding one JSON-encoded list field.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Missing, `null`, or text encoding `null`.
    Absent,
    /// Text that is not JSON, or list elements of the wrong shape.
    Malformed(String),
    /// Decoded to something other than a list.
    NotAList,
    Present(T),
}

impl<T> Decoded<T> {
    /// Absent → `None`; malformed → configuration error; not a list → fatal.
    pub fn resolve(self, field: &str) -> std::result::Result<Option<T>, DecodeError> {
        match self {
            Decoded::Absent => Ok(None),
            Decoded::Present(value) => Ok(Some(value)),
            Decoded::Malformed(_) => Err(malformed(field).into()),
            Decoded::NotAList => Err(RanklistError::not_a_list(field).into()),
        }
    }
}

/// Why a record could not become an [`IndicatorSpec`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The operator can fix this by reconfiguring the indicator.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The stored record breaks the indicator contract.
    #[error(transparent)]
    Fatal(#[from] RanklistError),
}

/// The configuration error reported for an undecodable field.
pub fn malformed(field: &str) -> ConfigError {
    ConfigError::new(
        ErrorCode::MalformedField,
        format!("/{field}"),
        format!("Configuration invalide : {field} mal formé"),
    )
    .with_hint(REPAIR_HINT)
}

/// Unwrap a possibly JSON-encoded value. `Err` carries the parse error.
fn unwrap_encoded(raw: Option<&Value>) -> std::result::Result<Option<Value>, String> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(err.to_string()),
        },
        Some(other) => Ok(Some(other.clone())),
    }
}

fn decode_list<T: DeserializeOwned>(raw: Option<&Value>) -> Decoded<Vec<T>> {
    match unwrap_encoded(raw) {
        Err(message) => Decoded::Malformed(message),
        Ok(None) => Decoded::Absent,
        Ok(Some(value @ Value::Array(_))) => match serde_json::from_value(value) {
            Ok(list) => Decoded::Present(list),
            Err(err) => Decoded::Malformed(err.to_string()),
        },
        Ok(Some(_)) => Decoded::NotAList,
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

impl IndicatorRecord {
    /// Parse a record from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Stored mode name, `standard` when absent or empty.
    pub fn mode_name(&self) -> &str {
        self.ranking_mode
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(ModeKind::Standard.as_str())
    }

    /// Mode the engine dispatches to. Unknown names run as `standard`.
    pub fn mode_kind(&self) -> ModeKind {
        ModeKind::parse_known(self.mode_name()).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    /// `groupBy`, treating an empty string as absent.
    pub fn group_by_name(&self) -> Option<&str> {
        self.group_by.as_deref().filter(|g| !g.is_empty())
    }

    /// `metricField`, treating an empty string as absent.
    pub fn metric_field_name(&self) -> Option<&str> {
        self.metric_field.as_deref().filter(|m| !m.is_empty())
    }

    pub fn selected_ranks(&self) -> Decoded<Vec<String>> {
        decode_list(self.selected_ranks.as_ref())
    }

    pub fn special_operations(&self) -> Decoded<Vec<SpecialOperation>> {
        decode_list(self.special_operations.as_ref())
    }

    pub fn included_ids(&self) -> Decoded<Vec<String>> {
        decode_list(self.included_collaborator_ids.as_ref())
    }

    pub fn excluded_ids(&self) -> Decoded<Vec<String>> {
        decode_list(self.excluded_collaborator_ids.as_ref())
    }

    /// Decoded filter object. Anything but an object means no filter.
    pub fn filter_set(&self) -> std::result::Result<Option<FilterSet>, ConfigError> {
        match unwrap_encoded(self.filters.as_ref()) {
            Err(_) => Err(malformed("filters")),
            Ok(value) => Ok(value.as_ref().and_then(FilterSet::from_value)),
        }
    }

    /// Decode into the typed form the pipelines consume.
    ///
    /// Degraded values are compensated the way the engine always has:
    /// unknown aggregations become `sum`, a sort order other than `desc`
    /// sorts ascending, a non-positive `topN` keeps every group.
    pub fn to_spec(&self) -> std::result::Result<IndicatorSpec, DecodeError> {
        trace_stage!("decode");
        let group_by = GroupBy::parse(self.group_by_name().unwrap_or_default());

        let mode = match self.mode_kind() {
            ModeKind::Standard => RankingMode::Standard(StandardConfig {
                group_by: group_by.clone(),
                aggregation: self
                    .aggregation
                    .as_deref()
                    .map(Aggregation::parse)
                    .unwrap_or_default(),
                filters: self.filter_set()?,
                top_n: self
                    .top_n
                    .filter(|&n| n > 0)
                    .and_then(|n| usize::try_from(n).ok()),
            }),
            ModeKind::MixedRanks => RankingMode::MixedRanks(MixedRanksConfig {
                selected_ranks: self
                    .selected_ranks()
                    .resolve("selectedRanks")?
                    .unwrap_or_default(),
                special_operations: self
                    .special_operations()
                    .resolve("specialOperations")?
                    .unwrap_or_default(),
                included_ids: self.included_ids().resolve("includedCollaboratorIds")?,
                excluded_ids: self.excluded_ids().resolve("excludedCollaboratorIds")?,
            }),
            ModeKind::SingleRankSelection => {
                let ranks = self
                    .selected_ranks()
                    .resolve("selectedRanks")?
                    .unwrap_or_default();
                RankingMode::SingleRank(SingleRankConfig {
                    // The mode ranks the first selected category only.
                    category: ranks.into_iter().next().unwrap_or_default(),
                    included_ids: self
                        .included_ids()
                        .resolve("includedCollaboratorIds")?
                        .unwrap_or_default(),
                })
            }
        };

        Ok(IndicatorSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            kind: self.kind,
            group_by,
            metric_field: self.metric_field_name().unwrap_or_default().to_string(),
            sort_order: self
                .sort_order
                .as_deref()
                .map_or(SortOrder::Asc, SortOrder::parse),
            mode,
        })
    }

    /// Flatten a typed spec into the stored shape. List fields are written as
    /// JSON arrays, never as encoded strings.
    pub fn from_spec(spec: &IndicatorSpec) -> Result<Self> {
        let mut record = IndicatorRecord {
            name: spec.name.clone(),
            description: spec.description.clone(),
            kind: spec.kind,
            ranking_mode: Some(spec.mode.kind().as_str().to_string()),
            group_by: Some(spec.group_by.as_str().to_string()),
            metric_field: Some(spec.metric_field.clone()),
            aggregation: Some(spec.aggregation().as_str().to_string()),
            sort_order: Some(spec.sort_order.as_str().to_string()),
            is_active: Some(true),
            ..Default::default()
        };

        match &spec.mode {
            RankingMode::Standard(config) => {
                record.filters = config.filters.as_ref().map(FilterSet::to_value);
                record.top_n = config.top_n.and_then(|n| i64::try_from(n).ok());
            }
            RankingMode::MixedRanks(config) => {
                record.selected_ranks = Some(string_list(&config.selected_ranks));
                record.special_operations = Some(serde_json::to_value(&config.special_operations)?);
                record.included_collaborator_ids = config.included_ids.as_deref().map(string_list);
                record.excluded_collaborator_ids = config.excluded_ids.as_deref().map(string_list);
            }
            RankingMode::SingleRank(config) => {
                record.selected_ranks = Some(string_list(std::slice::from_ref(&config.category)));
                record.included_collaborator_ids = Some(string_list(&config.included_ids));
            }
        }

        Ok(record)
    }
}
