//! Error types for `flashover`.
//!
//! Most failures in this subsystem are expected outcomes rather than faults:
//! ordinary freight has no hazard profile, cleanup of an already-expired zone
//! is a no-op, cancelling a finished incident is a no-op. Each domain gets its
//! own error enum and [`FlashoverError`] aggregates them for callers that
//! operate across module boundaries.

use std::path::PathBuf;
use thiserror::Error;

use crate::incident::IncidentId;
use crate::zone::ZoneId;

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `flashover` operations.
///
/// Aggregates all domain-specific errors and provides a unified interface
/// for callers that don't care which layer failed.
#[derive(Debug, Error)]
pub enum FlashoverError {
    /// Profile pack loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Profile selection error
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Incident scheduler error
    #[error(transparent)]
    Incident(#[from] IncidentError),

    /// Hazard zone registry error
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ============================================================================
// Profile Selection Errors
// ============================================================================

/// Profile selection errors.
///
/// `ProfileNotFound` is the common case for ordinary freight and should be
/// handled as a plain "nothing to do" by callers, not escalated.
#[derive(Debug, Error)]
pub enum SelectError {
    /// No hazard profile is mapped to this cargo key
    #[error("no hazard profile for cargo '{cargo}'")]
    ProfileNotFound {
        /// The cargo key that was looked up
        cargo: String,
    },

    /// The cargo maps to a tanker entry but no fill level was supplied
    #[error("cargo '{cargo}' requires a fill level")]
    FillLevelRequired {
        /// The cargo key that was looked up
        cargo: String,
    },
}

// ============================================================================
// Incident Scheduler Errors
// ============================================================================

/// Timeline scheduler errors.
#[derive(Debug, Error)]
pub enum IncidentError {
    /// The incident is unknown, already completed, or already cancelled
    #[error("incident not found: {0}")]
    NotFound(IncidentId),
}

// ============================================================================
// Hazard Zone Registry Errors
// ============================================================================

/// Hazard zone registry errors.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The zone is unknown, already expired, or already cleaned up.
    /// Cleanup is idempotent; a second call on the same id lands here.
    #[error("hazard zone not found: {0}")]
    NotFound(ZoneId),
}

// ============================================================================
// Profile Pack Errors
// ============================================================================

/// Profile pack loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {}: {message}", path.display())]
    ParseError {
        /// Path to the pack file (or a builtin pack name)
        path: PathBuf,
        /// Error message from the parser
        message: String,
    },

    /// Pack validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the pack file (or a builtin pack name)
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced pack file not found
    #[error("file not found: {}", path.display())]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during profile pack validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "profiles[2].phases[0].chain")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Validation failure that prevents the pack from being used
    Error,
    /// Potential issue that does not prevent loading
    Warning,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `flashover` operations.
pub type Result<T> = std::result::Result<T, FlashoverError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_error_display() {
        let err = SelectError::ProfileNotFound {
            cargo: "wool_bales".to_string(),
        };
        assert_eq!(err.to_string(), "no hazard profile for cargo 'wool_bales'");
    }

    #[test]
    fn test_fill_level_required_display() {
        let err = SelectError::FillLevelRequired {
            cargo: "fuel_tanker".to_string(),
        };
        assert!(err.to_string().contains("fuel_tanker"));
        assert!(err.to_string().contains("fill level"));
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "profiles[0].phases[1]".to_string(),
            message: "delay_end_ms precedes delay_ms".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: delay_end_ms precedes delay_ms at profiles[0].phases[1]"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "profiles[0]".to_string(),
            message: "label is empty".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(issue.to_string(), "warning: label is empty at profiles[0]");
    }

    #[test]
    fn test_top_level_from_config() {
        let err: FlashoverError = ConfigError::MissingFile {
            path: PathBuf::from("/packs/custom.yaml"),
        }
        .into();
        assert!(matches!(err, FlashoverError::Config(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("pack.yaml"),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("pack.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
