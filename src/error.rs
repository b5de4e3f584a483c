//! Error types
//!
//! Only two kinds of failure exist: a caller handed us parameters we refuse to
//! build a record from, or an external collaborator let us down. The second kind
//! never reaches the caller of record creation; it is logged and the enrichment
//! field is left out.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced to callers of the record API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CultureError {
    /// Non-positive area/spacing, non-numeric input or unknown crop code
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No stored record under this id
    #[error("Culture not found: {0}")]
    NotFound(u64),
}

impl CultureError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CultureError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CultureError>;

/// Reasons an external analysis call produced nothing usable
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Script timed out after {0:?}")]
    Timeout(Duration),

    #[error("Script exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Script returned no output")]
    EmptyOutput,

    #[error("Malformed script output: {0}")]
    MalformedOutput(String),

    /// Provider not wired in (e.g. analysis disabled)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}
