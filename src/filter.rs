//! Declarative row filters.
//!
//! A filter object maps attribute names to clauses. Every clause must hold
//! for a row to pass:
//!
//! ```json
//! {
//!   "rankCategory": "CN",
//!   "totalUnits": { "min": 10, "max": 250 },
//!   "coachRank": { "in": ["CD", "FC"] },
//!   "lastName": null
//! }
//! ```
//!
//! `null` clauses impose nothing. A range clause wins over `in` when an
//! object carries both, and an object with neither is no constraint.

use std::cmp::Ordering;

use serde_json::Value;

use crate::types::{FieldValue, Row};

/// One constraint on a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Inclusive bounds; a missing bound is open.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
    /// The attribute must equal one of the listed values.
    In(Vec<Value>),
    /// The attribute must strictly equal this scalar.
    Equals(Value),
    /// Placeholder for `null`, bare arrays and unrecognized objects.
    Unconstrained,
}

impl Clause {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Clause::Unconstrained,
            Value::Object(obj) if obj.contains_key("min") || obj.contains_key("max") => {
                Clause::Range {
                    min: obj.get("min").filter(|v| !v.is_null()).cloned(),
                    max: obj.get("max").filter(|v| !v.is_null()).cloned(),
                }
            }
            Value::Object(obj) => match obj.get("in") {
                Some(Value::Array(items)) => Clause::In(items.clone()),
                _ => Clause::Unconstrained,
            },
            Value::Array(_) => Clause::Unconstrained,
            scalar => Clause::Equals(scalar.clone()),
        }
    }

    /// JSON form accepted by [`Clause::from_value`].
    pub fn to_value(&self) -> Value {
        match self {
            Clause::Unconstrained => Value::Null,
            Clause::Equals(v) => v.clone(),
            Clause::In(items) => serde_json::json!({ "in": items }),
            Clause::Range { min, max } => {
                let mut obj = serde_json::Map::new();
                if let Some(min) = min {
                    obj.insert("min".into(), min.clone());
                }
                if let Some(max) = max {
                    obj.insert("max".into(), max.clone());
                }
                // Both bounds open: keep a range marker so it parses back as a range.
                if obj.is_empty() {
                    obj.insert("min".into(), Value::Null);
                }
                Value::Object(obj)
            }
        }
    }

    /// Evaluate against an attribute value (`None` when the row lacks it).
    pub fn matches(&self, field: Option<&FieldValue>) -> bool {
        match self {
            Clause::Unconstrained => true,
            Clause::Equals(expected) => field.is_some_and(|f| strict_eq(f, expected)),
            Clause::In(items) => field.is_some_and(|f| items.iter().any(|v| strict_eq(f, v))),
            Clause::Range { min, max } => {
                let Some(field) = field else {
                    return min.is_none() && max.is_none();
                };
                let above_min = min
                    .as_ref()
                    .map_or(true, |m| {
                        matches!(compare(field, m), Some(Ordering::Greater | Ordering::Equal))
                    });
                let below_max = max
                    .as_ref()
                    .map_or(true, |m| {
                        matches!(compare(field, m), Some(Ordering::Less | Ordering::Equal))
                    });
                above_min && below_max
            }
        }
    }
}

/// Same type and same value. Numbers compare numerically, so `5` equals `5.0`.
fn strict_eq(field: &FieldValue, expected: &Value) -> bool {
    match (field, expected) {
        (FieldValue::Number(n), Value::Number(e)) => e.as_f64() == Some(*n),
        (FieldValue::Text(s), Value::String(e)) => s == e,
        _ => false,
    }
}

/// Ordering between an attribute and a bound; `None` across types.
fn compare(field: &FieldValue, bound: &Value) -> Option<Ordering> {
    match (field, bound) {
        (FieldValue::Number(n), Value::Number(b)) => n.partial_cmp(&b.as_f64()?),
        (FieldValue::Text(s), Value::String(b)) => Some(s.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// A parsed filter object: clauses in declaration order, ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    clauses: Vec<(String, Clause)>,
}

impl FilterSet {
    /// Parse a filter object. Anything other than a JSON object means
    /// "no filter" and yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            clauses: obj
                .iter()
                .map(|(key, clause)| (key.clone(), Clause::from_value(clause)))
                .collect(),
        })
    }

    /// Add a clause programmatically.
    pub fn with_clause(mut self, key: impl Into<String>, clause: Clause) -> Self {
        self.clauses.push((key.into(), clause));
        self
    }

    pub fn clauses(&self) -> &[(String, Clause)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Serialize back to a filter object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.clauses
                .iter()
                .map(|(key, clause)| (key.clone(), clause.to_value()))
                .collect(),
        )
    }

    /// `true` when every clause holds for `row`.
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses
            .iter()
            .all(|(key, clause)| clause.matches(row.field(key).as_ref()))
    }
}

/// Keep the rows passing `filters`; with no filters every row is kept.
pub fn apply_filters<'a>(rows: &'a [Row], filters: Option<&FilterSet>) -> Vec<&'a Row> {
    trace_stage!("filter");
    match filters {
        None => rows.iter().collect(),
        Some(set) => rows.iter().filter(|row| set.matches(row)).collect(),
    }
}
