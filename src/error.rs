//! Error types for sketchport

use std::io;
use thiserror::Error;

/// Main error type for sketchport operations
///
/// Import converters report malformed content through the
/// [`CompatibilityReport`](crate::report::CompatibilityReport) instead of
/// returning this error; it surfaces only for caller mistakes and sink I/O.
#[derive(Debug, Error)]
pub enum PlanError {
    /// IO error occurred while writing an export payload
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Content was handed to the importer that the detector cannot import
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error parsing source content
    #[error("Parse error: {0}")]
    Parse(String),

    /// Entity references a wall that is not in the plan
    #[error("Invalid reference: {entity} refers to missing wall {wall_id}")]
    InvalidReference { entity: String, wall_id: String },

    /// Text decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// JSON codec error (glTF, model persistence)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for sketchport operations
pub type Result<T> = std::result::Result<T, PlanError>;

impl From<String> for PlanError {
    fn from(s: String) -> Self {
        PlanError::Custom(s)
    }
}

impl From<&str> for PlanError {
    fn from(s: &str) -> Self {
        PlanError::Custom(s.to_string())
    }
}

impl From<std::fmt::Error> for PlanError {
    fn from(e: std::fmt::Error) -> Self {
        PlanError::Custom(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanError::UnsupportedFormat("unknown".to_string());
        assert_eq!(err.to_string(), "Unsupported format: unknown");
    }

    #[test]
    fn test_invalid_reference_display() {
        let err = PlanError::InvalidReference {
            entity: "door d1".to_string(),
            wall_id: "w9".to_string(),
        };
        assert!(err.to_string().contains("door d1"));
        assert!(err.to_string().contains("w9"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: PlanError = io_err.into();
        assert!(matches!(err, PlanError::Io(_)));
    }

    #[test]
    fn test_from_str() {
        let err: PlanError = "boom".into();
        assert!(matches!(err, PlanError::Custom(ref s) if s == "boom"));
    }
}
