//! Grouping and aggregation of a metric over rows.
//!
//! Groups are kept in an insertion-ordered map: the first row that produces a
//! key decides that group's position. The standard pipeline relies on this
//! order as its tie-break after a stable sort.

use indexmap::IndexMap;
use serde_json::Value;

use crate::types::{opt_json, Aggregation, Details, GroupBy, Row};

/// Running state of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Aggregated metric (final once [`group_and_aggregate`] returns).
    pub value: f64,
    /// Number of member rows, whatever the aggregation.
    pub count: usize,
    /// Presentation details captured from the first member row.
    pub details: Details,
}

impl Group {
    fn new(details: Details) -> Self {
        Self {
            value: 0.0,
            count: 0,
            details,
        }
    }

    /// Fold one metric value into the group.
    fn accumulate(&mut self, metric: f64, aggregation: Aggregation) {
        self.count += 1;
        match aggregation {
            // Averages are divided once in a post-pass, never incrementally.
            Aggregation::Sum | Aggregation::Avg => self.value += metric,
            Aggregation::Count => self.value = self.count as f64,
            Aggregation::Min if self.count == 1 => self.value = metric,
            Aggregation::Min => self.value = self.value.min(metric),
            Aggregation::Max if self.count == 1 => self.value = metric,
            Aggregation::Max => self.value = self.value.max(metric),
        }
    }

    /// Category label recorded in the details, if any.
    pub fn category(&self) -> Option<String> {
        self.details
            .get("rankCategory")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

/// Groups in first-seen order.
pub type Groups = IndexMap<String, Group>;

/// Derive the group key and the details stored with a new group.
///
/// Returns `None` when the row has no usable key for this dimension.
pub fn group_key(row: &Row, group_by: &GroupBy) -> Option<(String, Details)> {
    let mut details = Details::new();
    let key = match group_by {
        GroupBy::Collaborator => {
            details = row.collaborator_details();
            row.display_name()
        }
        GroupBy::Coach => {
            let coach = row.coach_full_name.clone().unwrap_or_default();
            details.insert("coachFirstName".into(), opt_json(&row.coach_first_name));
            details.insert("coachLastName".into(), opt_json(&row.coach_last_name));
            details.insert("coachFullName".into(), Value::String(coach.clone()));
            coach
        }
        GroupBy::RankCategory => {
            let category = row.category().unwrap_or_default().to_string();
            details.insert("rankCategory".into(), Value::String(category.clone()));
            category
        }
        GroupBy::Field(name) => {
            let key = row.field(name).and_then(|v| v.to_key()).unwrap_or_default();
            details.insert(name.clone(), Value::String(key.clone()));
            key
        }
    };

    if key.is_empty() {
        None
    } else {
        Some((key, details))
    }
}

/// Group `rows` by `group_by` and reduce `metric_field` with `aggregation`.
///
/// Rows without a key for the dimension are skipped. The metric of each row
/// is its numeric coercion ([`Row::metric`]).
pub fn group_and_aggregate<'a, I>(
    rows: I,
    group_by: &GroupBy,
    metric_field: &str,
    aggregation: Aggregation,
) -> Groups
where
    I: IntoIterator<Item = &'a Row>,
{
    trace_stage!("group");
    let mut groups = Groups::default();

    for row in rows {
        let Some((key, details)) = group_key(row, group_by) else {
            continue;
        };
        let metric = row.metric(metric_field);
        groups
            .entry(key)
            .or_insert_with(|| Group::new(details))
            .accumulate(metric, aggregation);
    }

    if aggregation == Aggregation::Avg {
        for group in groups.values_mut() {
            if group.count > 0 {
                group.value /= group.count as f64;
            }
        }
    }

    groups
}
