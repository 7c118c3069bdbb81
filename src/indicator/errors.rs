//! Configuration error reported for an indicator definition.
//!
//! A [`ConfigError`] carries a stable [`ErrorCode`] for programmatic
//! matching, a JSON pointer `path` into the stored indicator, a
//! human-readable `message`, and an optional `hint` telling the operator how
//! to repair the indicator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error_code::ErrorCode;

/// A problem with an indicator that the operator can correct.
///
/// # Display format
///
/// ```text
/// [incompatible_ranks] /selectedRanks: Rangs incompatibles avec ce fichier : FA
/// ```
///
/// # JSON format
///
/// ```json
/// {
///   "code": "incompatible_ranks",
///   "path": "/selectedRanks",
///   "message": "Rangs incompatibles avec ce fichier : FA",
///   "hint": "Ce fichier ne contient pas les rangs requis (FA). Rangs disponibles : CN, CD"
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {path}: {message}")]
pub struct ConfigError {
    /// Stable error code for programmatic matching.
    pub code: ErrorCode,

    /// JSON pointer into the indicator, e.g. `"/selectedRanks"` or
    /// `"/specialOperations/1/targetCollaboratorId"`.
    pub path: String,

    /// Human-readable description of the problem.
    pub message: String,

    /// Optional suggestion for how to fix the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ConfigError {
    /// Create a new configuration error.
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint suggesting how to fix the problem.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ConfigError::new(
            ErrorCode::IncompatibleRanks,
            "/selectedRanks",
            "Rangs incompatibles avec ce fichier : FA",
        );
        assert_eq!(
            err.to_string(),
            "[incompatible_ranks] /selectedRanks: Rangs incompatibles avec ce fichier : FA"
        );
    }

    #[test]
    fn test_json_format() {
        let err = ConfigError::new(ErrorCode::MissingField, "/metricField", "metricField requis");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "missing_field");
        assert_eq!(value["path"], "/metricField");
        assert!(value.get("hint").is_none());

        let err = err.with_hint("Dupliquez cet indicateur pour le reconfigurer.");
        let json = serde_json::to_string(&err).unwrap();
        let back: ConfigError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_is_std_error() {
        let err = ConfigError::new(ErrorCode::UnknownField, "/typo", "Champ inconnu");
        let _: &dyn std::error::Error = &err;
    }
}
