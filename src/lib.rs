//! # rapid_ranklist
//!
//! A leaderboard engine for sales-production data.
//!
//! This library turns a dataset of collaborator production rows and a stored
//! indicator definition into a ranked leaderboard, in one of three modes:
//! standard group-and-aggregate, mixed ranks with special subtraction
//! operations, and single-rank selection.
//!
//! ## Features
//!
//! - **Validated**: indicators are checked against the dataset before any
//!   computation, with operator-readable messages and repair hints
//! - **Deterministic**: stable sorts and insertion-ordered grouping give
//!   reproducible ranks
//! - **Traced**: each stage enters a `tracing` span (feature `tracing`)

/// Enter a tracing span for one ranking stage. No-op without the `tracing`
/// feature.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("ranking_stage", stage = $name).entered();
    };
}

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod indicator;
pub mod ranking;
pub mod report;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{RanklistError, Result};
pub use types::{
    Aggregation, Details, FieldValue, GroupBy, RankingResult, RankingRow, Row, SortOrder,
};

// Re-export main functionality
pub use aggregate::{group_and_aggregate, Group, Groups};
pub use engine::{ComputeError, RankingEngine};
pub use filter::{apply_filters, Clause, FilterSet};
pub use indicator::{
    ConfigError, ErrorCode, IndicatorCatalog, IndicatorDraft, IndicatorPatch, IndicatorRecord,
    IndicatorSpec, RankingMode, SpecialOperation, ValidationEngine, ValidationReport, Verdict,
};
pub use ranking::{compute_mixed_ranks, compute_single_rank, compute_standard, rank_rows};
pub use report::{ReportLayout, ReportRenderer, ReportTable, TextRenderer};
pub use stats::{available_categories, list_collaborators, DatasetStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
