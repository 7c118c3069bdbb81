//! Stable error codes for indicator diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a [`ConfigError`](super::errors::ConfigError).
///
/// Codes serialize as `snake_case` strings and never change meaning, so
/// callers can match on them instead of on the (localized) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A field required by every mode is absent or empty.
    MissingField,
    /// A JSON-encoded field does not parse, or has the wrong element type.
    MalformedField,
    /// A required selection list is absent or empty.
    EmptySelection,
    /// Selected categories do not occur in the current dataset.
    IncompatibleRanks,
    /// Two special operations share a target.
    DuplicateTarget,
    /// A count exceeds what the mode or the engine accepts.
    LimitExceeded,
    /// A value outside the recognized vocabulary.
    InvalidValue,
    /// A field the indicator schema does not know.
    UnknownField,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::MalformedField => "malformed_field",
            ErrorCode::EmptySelection => "empty_selection",
            ErrorCode::IncompatibleRanks => "incompatible_ranks",
            ErrorCode::DuplicateTarget => "duplicate_target",
            ErrorCode::LimitExceeded => "limit_exceeded",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::UnknownField => "unknown_field",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
