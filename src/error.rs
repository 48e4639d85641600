//! Error types for flakr
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// All error types that can occur in flakr
#[derive(Debug, Error)]
pub enum FlakrError {
    /// No target command was given after `--`
    #[error("no command specified")]
    MissingCommand,

    /// A duration flag or config value could not be parsed
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    /// The results output file could not be opened
    #[error("unable to open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// One or more components were wired up with invalid or missing
    /// dependencies. All problems are aggregated into a single message.
    #[error("invalid configuration: {0}")]
    Construction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlakrError {
    /// Aggregate a list of construction problems into one error.
    pub fn construction(problems: Vec<String>) -> Self {
        FlakrError::Construction(problems.join("; "))
    }
}

/// Result type alias for flakr operations
pub type Result<T> = std::result::Result<T, FlakrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_command_error() {
        let err = FlakrError::MissingCommand;
        assert_eq!(err.to_string(), "no command specified");
    }

    #[test]
    fn test_invalid_duration_error() {
        let err = FlakrError::InvalidDuration {
            input: "10x".to_string(),
            reason: "unknown duration suffix: x".to_string(),
        };
        assert_eq!(err.to_string(), "invalid duration '10x': unknown duration suffix: x");
    }

    #[test]
    fn test_output_file_error() {
        let err = FlakrError::OutputFile {
            path: PathBuf::from("/no/such/dir/out.jsonl"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/no/such/dir/out.jsonl"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_construction_aggregates_problems() {
        let err = FlakrError::construction(vec![
            "missing results channel".to_string(),
            "missing stats".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing results channel; missing stats"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: FlakrError = io_err.into();
        assert!(matches!(err, FlakrError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: FlakrError = json_err.into();
        assert!(matches!(err, FlakrError::Json(_)));
    }
}
