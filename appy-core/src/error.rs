//! Error types for the appy view-model.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors that can occur in appy operations.
///
/// Payloads are plain strings so a single failure can be cloned and
/// broadcast to every subscriber of a datasource.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Received entities are not correctly sorted. Check if the backend sort matches the datasource sort")]
    UnsortedPage,

    #[error(
        "Single datasource received more than one element. There are duplicate ids or a wrongly implemented id()"
    )]
    DuplicateIdentity,

    #[error("Validation failed: {}", format_validation_errors(.0))]
    Validation(BTreeMap<String, String>),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppyError {
    /// Single-property validation failure with an error code.
    pub fn validation(property: &str, error_code: &str) -> Self {
        AppyError::Validation(BTreeMap::from([(
            property.to_string(),
            error_code.to_string(),
        )]))
    }
}

impl From<std::io::Error> for AppyError {
    fn from(e: std::io::Error) -> Self {
        AppyError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppyError {
    fn from(e: serde_json::Error) -> Self {
        AppyError::Serialization(e.to_string())
    }
}

fn format_validation_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(property, code)| format!("{property}: {code}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for appy operations.
pub type AppyResult<T> = Result<T, AppyError>;
