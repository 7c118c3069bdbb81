//! Validation engine for indicator definitions.
//!
//! The engine runs every registered [`ValidationRule`] against an
//! [`IndicatorRecord`] and the rows it is about to rank, and collects all
//! diagnostics into a [`ValidationReport`]. It never short-circuits, so an
//! operator sees every problem at once; [`ValidationReport::verdict`]
//! condenses the report into the single `{valid, error, hint}` answer the
//! HTTP layer returns, using the first error in rule order.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_ranklist::indicator::validation::ValidationEngine;
//!
//! let engine = ValidationEngine::default();
//! let report = engine.validate(&record, &rows);
//! if !report.is_valid() {
//!     let verdict = report.verdict();
//!     eprintln!("{:?} ({:?})", verdict.error, verdict.hint);
//! }
//! ```

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::error_code::ErrorCode;
use super::errors::ConfigError;
use super::record::{malformed, Decoded, IndicatorRecord, REPAIR_HINT};
use super::spec::ModeKind;
use crate::config::EngineConfig;
use crate::types::{Aggregation, GroupBy, Row, SortOrder};

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic blocks the computation or is only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: ConfigError,
}

impl ValidationDiagnostic {
    pub fn error(err: ConfigError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: ConfigError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

/// The condensed answer: valid, or the first error with its hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationReport {
    /// A report holding a single error.
    pub fn from_error(err: ConfigError) -> Self {
        Self {
            diagnostics: vec![ValidationDiagnostic::error(err)],
        }
    }

    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &ConfigError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &ConfigError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns `true` if there are no errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// Total number of diagnostics (errors + warnings).
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if there are no diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// First error in rule order, with its message and hint.
    pub fn verdict(&self) -> Verdict {
        match self.errors().next() {
            None => Verdict {
                valid: true,
                error: None,
                hint: None,
            },
            Some(err) => Verdict {
                valid: false,
                error: Some(err.message.clone()),
                hint: err.hint.clone(),
            },
        }
    }
}

// ─── Dataset view ───────────────────────────────────────────────────────────

/// What the rules may know about the rows being ranked.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    rows: &'a [Row],
    categories: Vec<&'a str>,
}

impl<'a> DatasetView<'a> {
    pub fn new(rows: &'a [Row]) -> Self {
        let mut seen = FxHashSet::default();
        let categories = rows
            .iter()
            .filter_map(Row::category)
            .filter(|c| seen.insert(*c))
            .collect();
        Self { rows, categories }
    }

    pub fn rows(&self) -> &'a [Row] {
        self.rows
    }

    /// Observed categories in first-seen order.
    pub fn categories(&self) -> &[&'a str] {
        &self.categories
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| *c == category)
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects an indicator against a dataset and
/// returns zero or more diagnostics.
///
/// Rules are stateless apart from their configuration and must be
/// `Send + Sync` so one engine can serve concurrent requests.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"selected_ranks"`).
    fn name(&self) -> &str;

    /// Inspect `record` and return any findings.
    fn validate(&self, record: &IndicatorRecord, data: &DatasetView<'_>) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s and collects all diagnostics into a
/// [`ValidationReport`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults(config: &EngineConfig) -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(RequiredFieldsRule));
        engine.add_rule(Box::new(SelectedRanksRule));
        engine.add_rule(Box::new(IncludedIdsRule));
        engine.add_rule(Box::new(SpecialOperationsRule {
            reject_duplicate_targets: config.reject_duplicate_targets,
        }));
        engine.add_rule(Box::new(SelectedRanksLimitRule {
            max_selected_ranks: config.max_selected_ranks,
        }));
        engine.add_rule(Box::new(EnumValuesRule));
        engine.add_rule(Box::new(TopNRule {
            max_top_n: config.max_top_n,
        }));
        engine.add_rule(Box::new(UnknownFieldsRule {
            strict: config.strict,
        }));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in execution order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run all rules against `record` and `rows` and return the report.
    pub fn validate(&self, record: &IndicatorRecord, rows: &[Row]) -> ValidationReport {
        trace_stage!("validate");
        let data = DatasetView::new(rows);
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(record, &data));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults(&EngineConfig::default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. groupBy and metricField are required in every mode ──────────────────

struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &str {
        "required_fields"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        let path = if record.group_by_name().is_none() {
            "/groupBy"
        } else if record.metric_field_name().is_none() {
            "/metricField"
        } else {
            return vec![];
        };

        vec![ValidationDiagnostic::error(
            ConfigError::new(
                ErrorCode::MissingField,
                path,
                "Configuration incomplète : groupBy et metricField sont requis",
            )
            .with_hint("Cet indicateur semble corrompu. Veuillez le dupliquer pour le recréer."),
        )]
    }
}

// ─── 2. selectedRanks decodes, is non-empty, and exists in the dataset ──────

struct SelectedRanksRule;

impl ValidationRule for SelectedRanksRule {
    fn name(&self) -> &str {
        "selected_ranks"
    }

    fn validate(&self, record: &IndicatorRecord, data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        if !record.mode_kind().uses_selection() {
            return vec![];
        }

        let ranks = match record.selected_ranks() {
            Decoded::Malformed(_) => {
                return vec![ValidationDiagnostic::error(malformed("selectedRanks"))];
            }
            Decoded::Present(ranks) if !ranks.is_empty() => ranks,
            _ => {
                return vec![ValidationDiagnostic::error(
                    ConfigError::new(
                        ErrorCode::EmptySelection,
                        "/selectedRanks",
                        format!(
                            "Configuration incomplète : aucun rang sélectionné pour le mode {}",
                            record.mode_name()
                        ),
                    )
                    .with_hint(REPAIR_HINT),
                )];
            }
        };

        let missing: Vec<&str> = ranks
            .iter()
            .map(String::as_str)
            .filter(|rank| !data.has_category(rank))
            .collect();
        if missing.is_empty() {
            return vec![];
        }

        let missing = missing.join(", ");
        vec![ValidationDiagnostic::error(
            ConfigError::new(
                ErrorCode::IncompatibleRanks,
                "/selectedRanks",
                format!("Rangs incompatibles avec ce fichier : {missing}"),
            )
            .with_hint(format!(
                "Ce fichier ne contient pas les rangs requis ({missing}). Rangs disponibles : {}",
                data.categories().join(", ")
            )),
        )]
    }
}

// ─── 3. includedCollaboratorIds decodes and is non-empty ────────────────────

// Ids are not cross-checked against the dataset: they change with every
// upload, and the mixed-ranks pipeline re-derives membership from the
// selected categories.
struct IncludedIdsRule;

impl ValidationRule for IncludedIdsRule {
    fn name(&self) -> &str {
        "included_ids"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        if !record.mode_kind().uses_selection() {
            return vec![];
        }

        match record.included_ids() {
            Decoded::Malformed(_) => {
                vec![ValidationDiagnostic::error(malformed("includedCollaboratorIds"))]
            }
            Decoded::Present(ids) if !ids.is_empty() => vec![],
            _ => vec![ValidationDiagnostic::error(
                ConfigError::new(
                    ErrorCode::EmptySelection,
                    "/includedCollaboratorIds",
                    format!(
                        "Configuration incomplète : aucun collaborateur sélectionné pour le mode {}",
                        record.mode_name()
                    ),
                )
                .with_hint(REPAIR_HINT),
            )],
        }
    }
}

// ─── 4. specialOperations decodes and targets are distinct ──────────────────

struct SpecialOperationsRule {
    reject_duplicate_targets: bool,
}

impl ValidationRule for SpecialOperationsRule {
    fn name(&self) -> &str {
        "special_operations"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        if record.mode_kind() != ModeKind::MixedRanks {
            return vec![];
        }

        let operations = match record.special_operations() {
            Decoded::Malformed(_) => {
                return vec![ValidationDiagnostic::error(malformed("specialOperations"))];
            }
            Decoded::Present(ops) => ops,
            // A non-list here is a contract violation, raised at decode time.
            Decoded::Absent | Decoded::NotAList => return vec![],
        };

        let mut out = Vec::new();
        let mut targets = FxHashSet::default();
        for (index, op) in operations.iter().enumerate() {
            let target = op.target_collaborator_id.as_str();
            if target.is_empty() {
                out.push(ValidationDiagnostic::error(
                    ConfigError::new(
                        ErrorCode::MissingField,
                        format!("/specialOperations/{index}/targetCollaboratorId"),
                        "Opération spéciale sans collaborateur cible",
                    )
                    .with_hint(REPAIR_HINT),
                ));
                continue;
            }
            if !targets.insert(target) {
                let err = ConfigError::new(
                    ErrorCode::DuplicateTarget,
                    format!("/specialOperations/{index}/targetCollaboratorId"),
                    format!(
                        "Opérations spéciales en conflit : le collaborateur {} est ciblé plusieurs fois",
                        op.target_collaborator_name.as_deref().unwrap_or(target)
                    ),
                )
                .with_hint("Regroupez les soustractions d'un même collaborateur en une seule opération.");
                out.push(if self.reject_duplicate_targets {
                    ValidationDiagnostic::error(err)
                } else {
                    ValidationDiagnostic::warning(err)
                });
            }
        }
        out
    }
}

// ─── 5. Number of selected categories per mode ──────────────────────────────

struct SelectedRanksLimitRule {
    max_selected_ranks: usize,
}

impl ValidationRule for SelectedRanksLimitRule {
    fn name(&self) -> &str {
        "selected_ranks_limit"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        let Decoded::Present(ranks) = record.selected_ranks() else {
            return vec![];
        };

        match record.mode_kind() {
            ModeKind::MixedRanks if ranks.len() > self.max_selected_ranks => {
                vec![ValidationDiagnostic::warning(
                    ConfigError::new(
                        ErrorCode::LimitExceeded,
                        "/selectedRanks",
                        format!(
                            "{} rangs sélectionnés, le maximum conseillé est {}",
                            ranks.len(),
                            self.max_selected_ranks
                        ),
                    )
                    .with_hint(REPAIR_HINT),
                )]
            }
            ModeKind::SingleRankSelection if ranks.len() > 1 => {
                vec![ValidationDiagnostic::warning(ConfigError::new(
                    ErrorCode::LimitExceeded,
                    "/selectedRanks",
                    format!(
                        "Seul le premier rang sélectionné ({}) est utilisé en mode singleRankSelection",
                        ranks[0]
                    ),
                ))]
            }
            _ => vec![],
        }
    }
}

// ─── 6. Values outside the known vocabularies ───────────────────────────────

struct EnumValuesRule;

impl EnumValuesRule {
    fn unknown(path: &str, message: String, hint: String) -> ValidationDiagnostic {
        ValidationDiagnostic::warning(
            ConfigError::new(ErrorCode::InvalidValue, path, message).with_hint(hint),
        )
    }
}

impl ValidationRule for EnumValuesRule {
    fn name(&self) -> &str {
        "enum_values"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        let mode = record.mode_name();
        if ModeKind::parse_known(mode).is_none() {
            out.push(Self::unknown(
                "/rankingMode",
                format!("Mode de classement inconnu \"{mode}\", le mode standard sera utilisé"),
                "Valeurs acceptées : standard, mixedRanks, singleRankSelection".into(),
            ));
        }

        if let Some(order) = record.sort_order.as_deref() {
            if !SortOrder::is_known(order) {
                out.push(Self::unknown(
                    "/sortOrder",
                    format!("Ordre de tri inconnu \"{order}\", le tri sera croissant"),
                    "Valeurs acceptées : asc, desc".into(),
                ));
            }
        }

        if let Some(aggregation) = record.aggregation.as_deref() {
            if Aggregation::parse_known(aggregation).is_none() {
                out.push(Self::unknown(
                    "/aggregation",
                    format!("Agrégation inconnue \"{aggregation}\", sum sera utilisé"),
                    format!(
                        "Valeurs acceptées : {}",
                        Aggregation::ALL.map(|a| a.as_str()).join(", ")
                    ),
                ));
            }
        }

        if record.mode_kind() == ModeKind::Standard {
            if let Some(group_by) = record.group_by_name() {
                if !GroupBy::KNOWN.iter().any(|k| *k == group_by) {
                    out.push(Self::unknown(
                        "/groupBy",
                        format!("Regroupement inconnu \"{group_by}\", lu comme nom de champ"),
                        format!("Valeurs acceptées : {}", GroupBy::KNOWN.join(", ")),
                    ));
                }
            }
        }

        out
    }
}

// ─── 7. topN must be positive and within the engine cap ─────────────────────

struct TopNRule {
    max_top_n: Option<usize>,
}

impl ValidationRule for TopNRule {
    fn name(&self) -> &str {
        "top_n"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        let Some(top_n) = record.top_n else {
            return vec![];
        };

        if top_n <= 0 {
            return vec![ValidationDiagnostic::warning(
                ConfigError::new(
                    ErrorCode::InvalidValue,
                    "/topN",
                    format!("topN doit être positif (reçu {top_n}), aucune limite appliquée"),
                )
                .with_hint("Supprimez topN ou choisissez une valeur >= 1"),
            )];
        }

        match self.max_top_n {
            Some(max) if usize::try_from(top_n).map_or(true, |n| n > max) => {
                vec![ValidationDiagnostic::warning(ConfigError::new(
                    ErrorCode::LimitExceeded,
                    "/topN",
                    format!("topN ({top_n}) dépasse le maximum de {max}, {max} sera utilisé"),
                ))]
            }
            _ => vec![],
        }
    }
}

// ─── 8. Unknown fields (strict → error, non-strict → warning) ──────────────

struct UnknownFieldsRule {
    strict: bool,
}

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, record: &IndicatorRecord, _data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
        let mut keys: Vec<&String> = record.unknown_fields.keys().collect();
        keys.sort();

        let diag_fn = if self.strict {
            ValidationDiagnostic::error
        } else {
            ValidationDiagnostic::warning
        };
        keys.into_iter()
            .map(|key| {
                diag_fn(
                    ConfigError::new(
                        ErrorCode::UnknownField,
                        format!("/{key}"),
                        format!("Champ inconnu \"{key}\""),
                    )
                    .with_hint("Vérifiez l'orthographe ou supprimez ce champ"),
                )
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> IndicatorRecord {
        serde_json::from_value(value).unwrap()
    }

    fn rows(categories: &[&str]) -> Vec<Row> {
        categories
            .iter()
            .enumerate()
            .map(|(i, c)| Row::new(format!("r{i}"), Some("P"), None, Some(c)))
            .collect()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::default()
    }

    fn mixed(extra: Value) -> IndicatorRecord {
        let mut base = json!({
            "name": "Mixte",
            "rankingMode": "mixedRanks",
            "groupBy": "collaborator",
            "metricField": "totalUnits",
            "selectedRanks": ["CN", "CD"],
            "includedCollaboratorIds": ["r0", "r1"]
        });
        if let (Some(obj), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        record(base)
    }

    // ─── Valid indicators ───────────────────────────────────────────────

    #[test]
    fn test_standard_indicator_is_valid() {
        let rec = record(json!({
            "name": "Top",
            "groupBy": "collaborator",
            "metricField": "totalUnits",
            "aggregation": "sum",
            "sortOrder": "desc"
        }));
        let report = engine().validate(&rec, &rows(&["CN"]));
        assert!(report.is_empty());
        assert_eq!(
            report.verdict(),
            Verdict {
                valid: true,
                error: None,
                hint: None
            }
        );
    }

    #[test]
    fn test_mixed_indicator_is_valid() {
        let report = engine().validate(&mixed(json!({})), &rows(&["CN", "CD"]));
        assert!(report.is_valid());
    }

    #[test]
    fn test_verdict_serializes_without_empty_fields() {
        let value = serde_json::to_value(ValidationReport::default().verdict()).unwrap();
        assert_eq!(value, json!({ "valid": true }));
    }

    // ─── Rule: required_fields ──────────────────────────────────────────

    #[test]
    fn test_missing_metric_field() {
        let rec = record(json!({ "name": "x", "groupBy": "coach", "metricField": "" }));
        let report = engine().validate(&rec, &rows(&["CN"]));
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::MissingField);
        assert_eq!(errs[0].path, "/metricField");
    }

    #[test]
    fn test_required_fields_apply_to_every_mode() {
        let rec = record(json!({
            "rankingMode": "singleRankSelection",
            "metricField": "totalUnits",
            "selectedRanks": ["CN"],
            "includedCollaboratorIds": ["r0"]
        }));
        let verdict = engine().validate(&rec, &rows(&["CN"])).verdict();
        assert!(!verdict.valid);
        assert_eq!(
            verdict.error.as_deref(),
            Some("Configuration incomplète : groupBy et metricField sont requis")
        );
        assert!(verdict.hint.is_some());
    }

    // ─── Rule: selected_ranks ───────────────────────────────────────────

    #[test]
    fn test_missing_categories_reported_with_available_ones() {
        let rec = mixed(json!({ "selectedRanks": ["CN", "FA"] }));
        let verdict = engine().validate(&rec, &rows(&["CN", "CD", "CN"])).verdict();
        assert!(!verdict.valid);
        assert_eq!(
            verdict.error.as_deref(),
            Some("Rangs incompatibles avec ce fichier : FA")
        );
        assert_eq!(
            verdict.hint.as_deref(),
            Some("Ce fichier ne contient pas les rangs requis (FA). Rangs disponibles : CN, CD")
        );
    }

    #[test]
    fn test_malformed_selected_ranks() {
        let rec = mixed(json!({ "selectedRanks": "[CN" }));
        let report = engine().validate(&rec, &rows(&["CN"]));
        let first = report.errors().next().unwrap();
        assert_eq!(first.code, ErrorCode::MalformedField);
        assert_eq!(first.message, "Configuration invalide : selectedRanks mal formé");
    }

    #[test]
    fn test_empty_or_non_list_selected_ranks() {
        for value in [json!([]), json!("[]"), json!(null), json!("\"CN\"")] {
            let rec = mixed(json!({ "selectedRanks": value }));
            let report = engine().validate(&rec, &rows(&["CN"]));
            let first = report.errors().next().unwrap();
            assert_eq!(first.code, ErrorCode::EmptySelection);
            assert!(first.message.ends_with("mixedRanks"));
        }
    }

    #[test]
    fn test_standard_mode_ignores_selection_fields() {
        let rec = record(json!({
            "groupBy": "collaborator",
            "metricField": "totalUnits",
            "selectedRanks": "garbage"
        }));
        assert!(engine().validate(&rec, &rows(&["CN"])).is_valid());
    }

    // ─── Rule: included_ids ─────────────────────────────────────────────

    #[test]
    fn test_included_ids_required_but_not_cross_checked() {
        let rec = mixed(json!({ "includedCollaboratorIds": [] }));
        let report = engine().validate(&rec, &rows(&["CN", "CD"]));
        assert_eq!(report.errors().next().unwrap().code, ErrorCode::EmptySelection);

        // Ids from a previous upload are accepted.
        let rec = mixed(json!({ "includedCollaboratorIds": ["stale-1"] }));
        assert!(engine().validate(&rec, &rows(&["CN", "CD"])).is_valid());
    }

    // ─── Rule: special_operations ───────────────────────────────────────

    #[test]
    fn test_duplicate_targets_rejected() {
        let rec = mixed(json!({
            "specialOperations": [
                { "targetCollaboratorId": "r0", "subtractCollaboratorIds": ["r1"] },
                { "targetCollaboratorId": "r0", "subtractCollaboratorIds": ["r2"] }
            ]
        }));
        let report = engine().validate(&rec, &rows(&["CN", "CD"]));
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::DuplicateTarget);
        assert_eq!(errs[0].path, "/specialOperations/1/targetCollaboratorId");
    }

    #[test]
    fn test_duplicate_targets_downgraded_by_config() {
        let rec = mixed(json!({
            "specialOperations": [
                { "targetCollaboratorId": "r0", "subtractCollaboratorIds": [] },
                { "targetCollaboratorId": "r0", "subtractCollaboratorIds": [] }
            ]
        }));
        let config = EngineConfig::default().with_reject_duplicate_targets(false);
        let report = ValidationEngine::with_defaults(&config).validate(&rec, &rows(&["CN", "CD"]));
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_malformed_special_operations() {
        let rec = mixed(json!({ "specialOperations": "not json" }));
        let report = engine().validate(&rec, &rows(&["CN", "CD"]));
        assert_eq!(report.errors().next().unwrap().path, "/specialOperations");
    }

    // ─── Rule: selected_ranks_limit ─────────────────────────────────────

    #[test]
    fn test_too_many_ranks_warns() {
        let rec = mixed(json!({ "selectedRanks": ["CN", "CD", "FC", "EX"] }));
        let report = engine().validate(&rec, &rows(&["CN", "CD", "FC", "EX"]));
        assert!(report.is_valid());
        assert_eq!(report.warnings().next().unwrap().code, ErrorCode::LimitExceeded);
    }

    #[test]
    fn test_single_rank_with_several_ranks_warns() {
        let rec = mixed(json!({ "rankingMode": "singleRankSelection" }));
        let report = engine().validate(&rec, &rows(&["CN", "CD"]));
        assert!(report.is_valid());
        let warning = report.warnings().next().unwrap();
        assert!(warning.message.contains("CN"));
    }

    // ─── Rule: enum_values / top_n ──────────────────────────────────────

    #[test]
    fn test_degraded_values_warn() {
        let rec = record(json!({
            "rankingMode": "bracket",
            "groupBy": "coachRank",
            "metricField": "totalUnits",
            "aggregation": "median",
            "sortOrder": "up",
            "topN": 0
        }));
        let report = engine().validate(&rec, &rows(&["CN"]));
        assert!(report.is_valid());
        let paths: Vec<_> = report.warnings().map(|w| w.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/rankingMode", "/sortOrder", "/aggregation", "/groupBy", "/topN"]
        );
    }

    #[test]
    fn test_top_n_above_cap_warns() {
        let rec = record(json!({ "groupBy": "coach", "metricField": "totalUnits", "topN": 500 }));
        let config = EngineConfig::default().with_max_top_n(Some(100));
        let report = ValidationEngine::with_defaults(&config).validate(&rec, &rows(&["CN"]));
        assert_eq!(report.warnings().next().unwrap().code, ErrorCode::LimitExceeded);
    }

    // ─── Rule: unknown_fields ───────────────────────────────────────────

    #[test]
    fn test_unknown_fields_warn_then_fail_when_strict() {
        let rec = record(json!({ "groupBy": "coach", "metricField": "totalUnits", "zeta": 1, "alpha": 2 }));
        let report = engine().validate(&rec, &rows(&["CN"]));
        assert!(report.is_valid());
        let paths: Vec<_> = report.warnings().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, vec!["/alpha", "/zeta"]);

        let strict = ValidationEngine::with_defaults(&EngineConfig::default().with_strict(true));
        let report = strict.validate(&rec, &rows(&["CN"]));
        assert_eq!(report.errors().count(), 2);
    }

    // ─── Engine ─────────────────────────────────────────────────────────

    #[test]
    fn test_rule_order() {
        assert_eq!(
            engine().rule_names(),
            vec![
                "required_fields",
                "selected_ranks",
                "included_ids",
                "special_operations",
                "selected_ranks_limit",
                "enum_values",
                "top_n",
                "unknown_fields"
            ]
        );
    }

    #[test]
    fn test_custom_rule() {
        struct AlwaysWarn;
        impl ValidationRule for AlwaysWarn {
            fn name(&self) -> &str {
                "always_warn"
            }
            fn validate(&self, _: &IndicatorRecord, data: &DatasetView<'_>) -> Vec<ValidationDiagnostic> {
                vec![ValidationDiagnostic::warning(ConfigError::new(
                    ErrorCode::InvalidValue,
                    "",
                    format!("{} rows", data.rows().len()),
                ))]
            }
        }

        let mut engine = ValidationEngine::new();
        engine.add_rule(Box::new(AlwaysWarn));
        let report = engine.validate(&IndicatorRecord::default(), &rows(&["CN", "CD"]));
        assert_eq!(report.len(), 1);
        assert_eq!(report.warnings().next().unwrap().message, "2 rows");
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let rec = mixed(json!({ "selectedRanks": "[\"CN\"]" }));
        let before = rec.clone();
        let _ = engine().validate(&rec, &rows(&["CN"]));
        assert_eq!(rec, before);
    }
}
