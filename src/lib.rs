//! Starquery: cross-referencing astronomical target lists against remote archives
//!
//! This crate reads target lists (whitespace, tab-separated or fixed-width text),
//! resolves their identifiers against SIMBAD, fetches photometry in a single batch,
//! filters by magnitude limits and queries instrument archives (VLT/SPHERE and
//! Gemini/GPI) for existing observations. Every run writes timestamped result
//! files plus a "no-data" list of targets nothing was found for.

use std::path::PathBuf;
use thiserror::Error;

pub mod archives;
pub mod compare;
pub mod config;
pub mod http;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod simbad;
pub mod sources;

// Re-export commonly used types
pub use config::QueryConfig;
pub use outcome::{AttributeSet, AttributeValue, QueryOutcome};
pub use sources::{load_source_list, InputFormat, SourceRecord};

/// Main error type for the starquery library
#[derive(Debug, Error)]
pub enum StarqueryError {
    #[error("File '{0}' not found")]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Remote query failed: {0}")]
    RemoteError(String),

    #[error("Malformed response: {0}")]
    ResponseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid filter condition: {0}")]
    InvalidPredicate(String),
}

/// Result type for starquery operations
pub type Result<T> = std::result::Result<T, StarqueryError>;

impl From<reqwest::Error> for StarqueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StarqueryError::RemoteError(format!("request timed out: {}", e))
        } else {
            StarqueryError::RemoteError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StarqueryError {
    fn from(e: serde_json::Error) -> Self {
        StarqueryError::ResponseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StarqueryError::FileNotFound(PathBuf::from("taurus_sources_rev.txt"));
        assert_eq!(err.to_string(), "File 'taurus_sources_rev.txt' not found");

        let err = StarqueryError::RemoteError("connection reset".to_string());
        assert_eq!(err.to_string(), "Remote query failed: connection reset");
    }

    #[test]
    fn test_json_error_is_response_error() {
        let err: StarqueryError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, StarqueryError::ResponseError(_)));
    }
}
