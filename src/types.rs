//! Core types for rapid_ranklist
//!
//! This module defines the fundamental data structures shared by every
//! pipeline: ingested production rows, the small enums an indicator is made
//! of, and the ranking output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque per-row presentation data attached to a ranking entry.
pub type Details = Map<String, Value>;

// ============================================================================
// Field values
// ============================================================================

/// A single attribute read from a [`Row`] by name.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Numeric view: numbers as-is, text parsed as a decimal number.
    ///
    /// Returns `None` for unparseable text and for NaN.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    // Blank text coerces to zero, like an empty spreadsheet cell.
                    0.0
                } else {
                    trimmed.parse::<f64>().ok()?
                }
            }
        };
        if n.is_nan() {
            None
        } else {
            Some(n)
        }
    }

    /// Text view, `None` for numbers.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Render as a group key. Empty text gives `None`.
    pub fn to_key(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) if s.is_empty() => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) if n.is_nan() => None,
            FieldValue::Number(n) => Some(format_number(*n)),
        }
    }

    /// Convert to a JSON value for presentation details.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ============================================================================
// Row
// ============================================================================

/// One ingested production record.
///
/// Field names follow the camelCase shape produced by the ingestion
/// collaborator. Rows are immutable once ingested; the engine only reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Unique identifier assigned at ingestion. Empty means the collaborator
    /// broke its contract.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub rank_order: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub rank_category: Option<String>,
    #[serde(default)]
    pub coach_rank: Option<String>,
    #[serde(default)]
    pub coach_first_name: Option<String>,
    #[serde(default)]
    pub coach_last_name: Option<String>,
    #[serde(default)]
    pub coach_full_name: Option<String>,
    #[serde(default)]
    pub nb_deals_personal: f64,
    #[serde(default)]
    pub nb_deals_global: f64,
    #[serde(default)]
    pub units_brut_personal: f64,
    #[serde(default)]
    pub units_brut_global: f64,
    #[serde(default)]
    pub units_brut_parallel: f64,
    #[serde(default)]
    pub total_units: f64,
}

/// Join name parts with a single space, skipping missing or blank parts.
pub fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

impl Row {
    /// Create a row, deriving the full name from first and last name.
    pub fn new(
        id: impl Into<String>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        rank_category: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            full_name: join_name(first_name, last_name),
            rank_category: rank_category.map(str::to_string),
            ..Default::default()
        }
    }

    /// Attach a supervisor, deriving the coach full name.
    pub fn with_coach(
        mut self,
        coach_first_name: Option<&str>,
        coach_last_name: Option<&str>,
        coach_rank: Option<&str>,
    ) -> Self {
        self.coach_first_name = coach_first_name.map(str::to_string);
        self.coach_last_name = coach_last_name.map(str::to_string);
        self.coach_full_name = join_name(coach_first_name, coach_last_name);
        self.coach_rank = coach_rank.map(str::to_string);
        self
    }

    /// Set the three gross-unit metrics and the derived total.
    pub fn with_units(mut self, personal: f64, global: f64, parallel: f64) -> Self {
        self.units_brut_personal = personal;
        self.units_brut_global = global;
        self.units_brut_parallel = parallel;
        self.total_units = personal + global + parallel;
        self
    }

    /// Set the personal and global deal counts.
    pub fn with_deals(mut self, personal: f64, global: f64) -> Self {
        self.nb_deals_personal = personal;
        self.nb_deals_global = global;
        self
    }

    /// Name used to identify a collaborator: the full name, or
    /// `"first last"` trimmed when no full name is stored.
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }

    /// Category label, treating an empty string as absent.
    pub fn category(&self) -> Option<&str> {
        self.rank_category.as_deref().filter(|c| !c.is_empty())
    }

    /// Read an attribute by its camelCase name.
    ///
    /// Unknown names and absent optional attributes yield `None`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        match name {
            "id" => Some(FieldValue::Text(self.id.clone())),
            "rankOrder" => self.rank_order.map(|n| FieldValue::Number(n as f64)),
            "firstName" => text(&self.first_name),
            "lastName" => text(&self.last_name),
            "fullName" => text(&self.full_name),
            "rankCategory" => text(&self.rank_category),
            "coachRank" => text(&self.coach_rank),
            "coachFirstName" => text(&self.coach_first_name),
            "coachLastName" => text(&self.coach_last_name),
            "coachFullName" => text(&self.coach_full_name),
            "nbDealsPersonal" => Some(FieldValue::Number(self.nb_deals_personal)),
            "nbDealsGlobal" => Some(FieldValue::Number(self.nb_deals_global)),
            "unitsBrutPersonal" => Some(FieldValue::Number(self.units_brut_personal)),
            "unitsBrutGlobal" => Some(FieldValue::Number(self.units_brut_global)),
            "unitsBrutParallel" => Some(FieldValue::Number(self.units_brut_parallel)),
            "totalUnits" => Some(FieldValue::Number(self.total_units)),
            _ => None,
        }
    }

    /// Numeric coercion of an attribute: 0 when absent, non-numeric or NaN.
    pub fn metric(&self, name: &str) -> f64 {
        self.field(name)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    /// Presentation details for a collaborator entry.
    pub fn collaborator_details(&self) -> Details {
        let mut details = Details::new();
        details.insert("firstName".into(), opt_json(&self.first_name));
        details.insert("lastName".into(), opt_json(&self.last_name));
        details.insert("rankCategory".into(), opt_json(&self.rank_category));
        details.insert("fullName".into(), Value::String(self.display_name()));
        details
    }
}

pub(crate) fn opt_json(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

// ============================================================================
// Indicator building blocks
// ============================================================================

/// Direction of the leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a stored sort order. Anything other than exactly `desc` sorts
    /// ascending.
    pub fn parse(value: &str) -> Self {
        if value == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    /// Returns `true` for a recognised spelling.
    pub fn is_known(value: &str) -> bool {
        matches!(value, "asc" | "desc")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Reduction applied to a metric within one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Sum,
        Aggregation::Avg,
        Aggregation::Count,
        Aggregation::Min,
        Aggregation::Max,
    ];

    /// Parse a stored aggregation name. Unknown names fall back to `Sum`.
    pub fn parse(value: &str) -> Self {
        Self::parse_known(value).unwrap_or(Aggregation::Sum)
    }

    /// Parse a stored aggregation name, `None` when unknown.
    pub fn parse_known(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sum" => Some(Aggregation::Sum),
            "avg" => Some(Aggregation::Avg),
            "count" => Some(Aggregation::Count),
            "min" => Some(Aggregation::Min),
            "max" => Some(Aggregation::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Count => "count",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }
}

/// Grouping dimension for the standard pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupBy {
    /// One group per collaborator name.
    Collaborator,
    /// One group per supervisor; rows without one are dropped.
    Coach,
    /// One group per category label.
    RankCategory,
    /// Literal attribute name read from the row.
    Field(String),
}

impl GroupBy {
    /// The three dimensions accepted when creating an indicator.
    pub const KNOWN: [&'static str; 3] = ["collaborator", "coach", "rank_category"];

    pub fn parse(value: &str) -> Self {
        match value {
            "collaborator" => GroupBy::Collaborator,
            "coach" => GroupBy::Coach,
            "rank_category" => GroupBy::RankCategory,
            other => GroupBy::Field(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupBy::Collaborator => "collaborator",
            GroupBy::Coach => "coach",
            GroupBy::RankCategory => "rank_category",
            GroupBy::Field(name) => name,
        }
    }
}

impl Serialize for GroupBy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GroupBy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(GroupBy::parse(&s))
    }
}

// ============================================================================
// Ranking output
// ============================================================================

/// One entry of a computed leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRow {
    /// Dense 1-based position after sorting.
    pub rank: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_category: Option<String>,
    pub value: f64,
    #[serde(default)]
    pub details: Details,
}

impl RankingRow {
    /// Create an unranked entry; [`crate::ranking::rank_rows`] assigns ranks.
    pub fn unranked(
        name: impl Into<String>,
        rank_category: Option<String>,
        value: f64,
        details: Details,
    ) -> Self {
        Self {
            rank: 0,
            name: name.into(),
            rank_category,
            value,
            details,
        }
    }
}

/// A computed leaderboard plus the indicator metadata it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    pub indicator_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub group_by: String,
    pub metric_field: String,
    pub aggregation: String,
    pub total_rows: usize,
    pub data: Vec<RankingRow>,
}
