//! Ranking engine: validate, decode, dispatch.
//!
//! [`RankingEngine::compute`] is the single entry point the hosting layer
//! calls with a stored indicator and the rows of one dataset:
//!
//! 1. rows without an id abort the call (upstream contract violation)
//! 2. the [`ValidationEngine`] checks the indicator against the rows; any
//!    error short-circuits with the full [`ValidationReport`]
//! 3. the record is decoded into an [`IndicatorSpec`]
//! 4. the decoded [`RankingMode`] selects the pipeline
//!
//! The engine holds no mutable state; one instance can serve concurrent
//! requests.

use thiserror::Error;

use crate::config::EngineConfig;
use crate::errors::{RanklistError, Result};
use crate::indicator::record::{DecodeError, IndicatorRecord};
use crate::indicator::spec::{IndicatorSpec, MixedRanksConfig, RankingMode, StandardConfig};
use crate::indicator::validation::{ValidationEngine, ValidationReport, Verdict};
use crate::ranking::{compute_mixed_ranks, compute_single_rank, compute_standard};
use crate::types::{RankingResult, RankingRow, Row};

/// Why a ranking could not be computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// The indicator does not fit the dataset; the operator can fix it.
    #[error("invalid indicator: {}", first_error(.0))]
    Invalid(ValidationReport),

    /// An upstream collaborator broke the row or indicator contract.
    #[error(transparent)]
    Fatal(#[from] RanklistError),
}

fn first_error(report: &ValidationReport) -> String {
    report
        .errors()
        .next()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl ComputeError {
    /// The `{valid, error, hint}` answer for this failure.
    pub fn verdict(&self) -> Verdict {
        match self {
            ComputeError::Invalid(report) => report.verdict(),
            ComputeError::Fatal(err) => Verdict {
                valid: false,
                error: Some(err.to_string()),
                hint: None,
            },
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ComputeError::Invalid(_))
    }
}

impl From<DecodeError> for ComputeError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Config(err) => ComputeError::Invalid(ValidationReport::from_error(err)),
            DecodeError::Fatal(err) => ComputeError::Fatal(err),
        }
    }
}

/// Validates indicators and computes leaderboards.
pub struct RankingEngine {
    config: EngineConfig,
    validator: ValidationEngine,
}

impl RankingEngine {
    /// Create an engine with the default rule set for `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let validator = ValidationEngine::with_defaults(&config);
        Ok(Self { config, validator })
    }

    /// Replace the validation rules.
    pub fn with_validator(mut self, validator: ValidationEngine) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run validation only.
    pub fn validate(&self, record: &IndicatorRecord, rows: &[Row]) -> ValidationReport {
        self.validator.validate(record, rows)
    }

    /// Validate `record` against `rows`, then compute its leaderboard.
    pub fn compute(
        &self,
        record: &IndicatorRecord,
        rows: &[Row],
    ) -> std::result::Result<RankingResult, ComputeError> {
        check_row_ids(rows)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            indicator = %record.name,
            mode = record.mode_name(),
            rows = rows.len(),
            "computing ranking"
        );

        let report = self.validator.validate(record, rows);
        if report.has_errors() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                indicator = %record.name,
                error = %first_error(&report),
                "indicator validation failed"
            );
            return Err(ComputeError::Invalid(report));
        }

        let spec = record.to_spec()?;
        let data = self.rank(&spec, rows);

        #[cfg(feature = "tracing")]
        tracing::debug!(indicator = %record.name, entries = data.len(), "ranking computed");

        Ok(RankingResult {
            indicator_name: record.name.clone(),
            description: record.description.clone(),
            group_by: record.group_by.clone().unwrap_or_default(),
            metric_field: spec.metric_field.clone(),
            aggregation: record
                .aggregation
                .clone()
                .unwrap_or_else(|| spec.aggregation().as_str().to_string()),
            total_rows: data.len(),
            data,
        })
    }

    /// Run the pipeline selected by `spec` without validating it.
    ///
    /// Mixed-ranks membership comes from the selected categories alone: the
    /// stored id lists belong to the upload the indicator was built on and
    /// are ignored. Single-rank selection uses its stored ids as-is.
    pub fn rank(&self, spec: &IndicatorSpec, rows: &[Row]) -> Vec<RankingRow> {
        let metric = spec.metric_field.as_str();
        match &spec.mode {
            RankingMode::Standard(config) => {
                let config = StandardConfig {
                    top_n: self.config.cap_top_n(config.top_n),
                    ..config.clone()
                };
                compute_standard(rows, &config, metric, spec.sort_order)
            }
            RankingMode::MixedRanks(config) => {
                let config = MixedRanksConfig {
                    included_ids: None,
                    excluded_ids: None,
                    ..config.clone()
                };
                compute_mixed_ranks(rows, &config, metric, spec.sort_order)
            }
            RankingMode::SingleRank(config) => {
                compute_single_rank(rows, config, metric, spec.sort_order)
            }
        }
    }
}

impl Default for RankingEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        let validator = ValidationEngine::with_defaults(&config);
        Self { config, validator }
    }
}

/// Every row must carry its ingestion id.
fn check_row_ids(rows: &[Row]) -> Result<()> {
    match rows.iter().position(|r| r.id.is_empty()) {
        Some(index) => Err(RanklistError::missing_row_id(index)),
        None => Ok(()),
    }
}
