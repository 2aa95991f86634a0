//! Error types for the service layer.

use std::fmt;

/// Errors produced by the service layer, wrapping acquisition errors
/// and adding not-found, cache, and input validation failures.
#[derive(Debug)]
pub enum TefasError {
    /// An error from the underlying acquisition client.
    Api(tefas_api::Error),
    /// No fund matched the requested code. A normal outcome (typo'd
    /// code), not an upstream failure; never logged as an error.
    NotFound { code: String },
    /// A cache operation failed (e.g. deserialization of cached data).
    Cache(String),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for TefasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::NotFound { code } => write!(f, "fund not found: {}", code),
            Self::Cache(msg) => write!(f, "Cache error: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for TefasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tefas_api::Error> for TefasError {
    fn from(e: tefas_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for TefasError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
