//! Error types for rapid_ranklist
//!
//! Configuration problems an operator can fix are reported as structured
//! diagnostics by [`crate::indicator::validation`]. The errors in this module
//! are the remaining failures: contract violations by the collaborators that
//! feed the engine (missing row ids, list fields that are not lists) and
//! catalog operations that are not allowed.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RanklistError>;

/// Main error type for rapid_ranklist
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RanklistError {
    /// A row handed to the engine has no unique identifier
    #[error("Row at position {index} has no identifier")]
    MissingRowId { index: usize },

    /// A decoded indicator field that must be a list is something else
    #[error("Field '{field}' must decode to a list")]
    NotAList { field: String },

    /// Configuration rejected outside of the validation engine
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// No indicator with this id exists in the catalog
    #[error("Indicator not found: {id}")]
    IndicatorNotFound { id: String },

    /// Predefined indicators may not be edited or deleted
    #[error("Cannot {action} predefined indicator '{name}'")]
    PredefinedImmutable { action: String, name: String },
}

impl RanklistError {
    /// Create a missing row id error
    pub fn missing_row_id(index: usize) -> Self {
        Self::MissingRowId { index }
    }

    /// Create a not-a-list error
    pub fn not_a_list(field: impl Into<String>) -> Self {
        Self::NotAList {
            field: field.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an indicator-not-found error
    pub fn indicator_not_found(id: impl Into<String>) -> Self {
        Self::IndicatorNotFound { id: id.into() }
    }

    /// Create a predefined-immutable error
    pub fn predefined_immutable(action: impl Into<String>, name: impl Into<String>) -> Self {
        Self::PredefinedImmutable {
            action: action.into(),
            name: name.into(),
        }
    }

    /// Check if this error reports a broken upstream contract
    /// (as opposed to a rejected catalog operation)
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingRowId { .. } | Self::NotAList { .. })
    }
}

impl From<serde_json::Error> for RanklistError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RanklistError::missing_row_id(3);
        assert_eq!(err.to_string(), "Row at position 3 has no identifier");

        let err = RanklistError::predefined_immutable("delete", "Top coachs");
        assert!(err.to_string().contains("Cannot delete"));
        assert!(err.to_string().contains("Top coachs"));
    }

    #[test]
    fn test_is_contract_violation() {
        assert!(RanklistError::missing_row_id(0).is_contract_violation());
        assert!(RanklistError::not_a_list("selectedRanks").is_contract_violation());
        assert!(!RanklistError::indicator_not_found("x").is_contract_violation());
    }

    #[test]
    fn test_from_serde_json() {
        let err: RanklistError = serde_json::from_str::<Vec<String>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RanklistError::Serialization { .. }));
    }
}
