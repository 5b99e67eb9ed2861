//! @ai:module:intent Error type surfaced at the benchmark loading boundary
//! @ai:module:layer domain
//! @ai:module:public_api LoadError, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for every phase of benchmark loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {message}")]
    ParseFailure { message: String },

    #[error("base is not a string in {path}")]
    BaseNotAString { path: PathBuf },

    #[error("Mandatory variable {key} not present")]
    MissingMandatoryKey { key: &'static str },

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Recursive value substitution is not supported, invalid {variable}: {expression}")]
    RecursiveSubstitution { variable: String, expression: String },

    #[error("Could not evaluate value {expression}: {reason}")]
    TemplateFailure { expression: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Results service call to {endpoint} failed: {reason}")]
    ServiceUnavailable { endpoint: String, reason: String },

    #[error("Results service {endpoint} returned {actual} items, expected {expected}")]
    ServiceProtocolMismatch {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Benchmark loading was cancelled")]
    Cancelled,

    #[error("Could not load benchmark {path}: {source}")]
    InFile {
        path: String,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// @ai:intent Attach the offending benchmark file to an error
    /// @ai:effects pure
    pub fn in_file(self, path: impl Into<String>) -> Self {
        LoadError::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// @ai:intent Unwrap file context to reach the error that caused the failure
    /// @ai:effects pure
    pub fn root_cause(&self) -> &LoadError {
        match self {
            LoadError::InFile { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
