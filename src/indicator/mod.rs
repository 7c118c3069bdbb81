//! Indicator definitions: stored shape, typed spec, validation and catalog.
//!
//! An indicator travels through these modules in order:
//!
//! 1. [`record::IndicatorRecord`]: the flat shape the persistence layer stores
//! 2. [`validation::ValidationEngine`]: checks it against the current rows
//! 3. [`spec::IndicatorSpec`]: the typed form the ranking pipelines consume
//!
//! [`catalog::IndicatorCatalog`] keeps the set of known indicators, seeds the
//! predefined ones and guards them against modification.

pub mod catalog;
pub mod error_code;
pub mod errors;
pub mod record;
pub mod spec;
pub mod validation;

pub use catalog::{IndicatorCatalog, IndicatorDraft, IndicatorPatch};
pub use error_code::ErrorCode;
pub use errors::ConfigError;
pub use record::{DecodeError, Decoded, IndicatorRecord};
pub use spec::{
    IndicatorKind, IndicatorSpec, MixedRanksConfig, ModeKind, RankingMode, SingleRankConfig,
    SpecialOperation, StandardConfig,
};
pub use validation::{
    Severity, ValidationDiagnostic, ValidationEngine, ValidationReport, ValidationRule, Verdict,
};
