//! Error types for the library layer.

use std::fmt;

use crate::dataset::DatasetConfigError;

/// Errors produced by the library layer.
///
/// Network and backend failures never reach callers of the query and
/// suggestion paths (they degrade to empty results); this type covers the
/// failures that are programming or input errors.
#[derive(Debug)]
pub enum TradeLensError {
    /// An error from the underlying API client.
    Api(tradelens_api::Error),
    /// Unknown dataset or an invalid dataset table.
    Config(DatasetConfigError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// Writing CSV output failed.
    Csv(csv::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for TradeLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for TradeLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<tradelens_api::Error> for TradeLensError {
    fn from(e: tradelens_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<DatasetConfigError> for TradeLensError {
    fn from(e: DatasetConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<serde_json::Error> for TradeLensError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<csv::Error> for TradeLensError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}
