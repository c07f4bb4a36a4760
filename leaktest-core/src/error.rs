//! Error types for leak test operations

use thiserror::Error;

/// Result type for leak test operations
pub type LeakTestResult<T> = Result<T, LeakTestError>;

/// Error taxonomy shared by the handler, repository, and messaging layers
#[derive(Error, Debug)]
pub enum LeakTestError {
    /// One or more rule violations, accumulated and reported together
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("The specified key '{0}' does not exist.")]
    UnknownKey(String),

    #[error("{0}")]
    NoMatchingData(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Unhandled(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),
}

impl LeakTestError {
    /// Create a validation error from a set of rule violations
    pub fn validation<I, S>(violations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation(violations.into_iter().map(Into::into).collect())
    }

    /// Create an unknown key error for a rejected query key
    pub fn unknown_key<S: Into<String>>(key: S) -> Self {
        Self::UnknownKey(key.into())
    }

    /// Create a no matching data error
    pub fn no_matching_data<S: Into<String>>(message: S) -> Self {
        Self::NoMatchingData(message.into())
    }

    /// Create a mapping error for a malformed stored record
    pub fn mapping<S: Into<String>>(message: S) -> Self {
        Self::Mapping(message.into())
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store(message.into())
    }

    /// Create an internal error for any otherwise unclassified failure
    pub fn unhandled<S: Into<String>>(message: S) -> Self {
        Self::Unhandled(message.into())
    }

    /// Status code carried on response envelopes, shared with the HTTP layer
    pub fn status_code(&self) -> u16 {
        match self {
            LeakTestError::Validation(_) => 400,
            LeakTestError::UnknownKey(_) => 404,
            LeakTestError::NoMatchingData(_) => 404,
            LeakTestError::Mapping(_) => 500,
            LeakTestError::Store(_) => 500,
            LeakTestError::Unhandled(_) => 500,
            LeakTestError::Json(_) => 500,
            LeakTestError::Uuid(_) => 500,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            LeakTestError::Validation(_) => "validation",
            LeakTestError::UnknownKey(_) => "unknown_key",
            LeakTestError::NoMatchingData(_) => "no_matching_data",
            LeakTestError::Mapping(_) => "mapping",
            LeakTestError::Store(_) => "store",
            LeakTestError::Unhandled(_) => "unhandled",
            LeakTestError::Json(_) => "json",
            LeakTestError::Uuid(_) => "uuid",
        }
    }
}
