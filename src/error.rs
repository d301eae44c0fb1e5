//! Error types for the capacity sizer
//!
//! The sizing engine itself never fails on bad input data: malformed values
//! are zeroed and malformed rows are dropped. The errors here cover the
//! boundary around it: policy loading and validation, file access, the REST
//! service and metrics exposition.

use thiserror::Error;

/// Unified error type for the sizer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Policy Errors
    // =========================================================================
    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Weight pair {name} must sum to 1.0 (data {data} + iops {iops})")]
    InvalidWeights { name: String, data: f64, iops: f64 },

    #[error("Tier cascade out of order at rule {index} ({tier})")]
    TierCascadeOrder { index: usize, tier: String },

    // =========================================================================
    // API Errors
    // =========================================================================
    #[error("API request validation failed: {0}")]
    ApiValidation(String),

    // =========================================================================
    // Metrics Errors
    // =========================================================================
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error was caused by caller-supplied configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::InvalidThreshold { .. }
                | Error::InvalidWeights { .. }
                | Error::TierCascadeOrder { .. }
                | Error::Yaml(_)
        )
    }

    /// Check if this error should be reported to an API caller as a bad request
    pub fn is_client_error(&self) -> bool {
        self.is_configuration() || matches!(self, Error::ApiValidation(_) | Error::Json(_))
    }
}

/// Result type alias for the sizer
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        let err = Error::InvalidWeights {
            name: "heavy".into(),
            data: 0.5,
            iops: 0.6,
        };
        assert!(err.is_configuration());
        assert!(err.is_client_error());

        let err = Error::TierCascadeOrder {
            index: 1,
            tier: "M100".into(),
        };
        assert!(err.is_configuration());
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::ApiValidation("bad mode".into()).is_client_error());
        assert!(!Error::ApiValidation("bad mode".into()).is_configuration());

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_client_error());
        assert!(!Error::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidThreshold {
            name: "dataIntensiveGb".into(),
            value: -1.0,
        };
        assert_eq!(err.to_string(), "Invalid threshold dataIntensiveGb: -1");
    }
}
