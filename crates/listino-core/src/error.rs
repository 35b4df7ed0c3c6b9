//! Error types for listino-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run.
///
/// Conditions the pipeline recovers from (missing columns, unparseable
/// cells, charset or dialect fallback, empty input) are not errors; they
/// surface as [`crate::Warning`]s and outcome values instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting was not provided
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    /// A setting was provided but could not be used
    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },

    /// Remote transfer failure (connect, login, cwd, retrieve, store)
    #[error("remote {operation} failed for '{path}': {source}")]
    Remote {
        operation: &'static str,
        path: String,
        #[source]
        source: suppaftp::FtpError,
    },

    /// Failed to read or write a local file
    #[error("failed to access '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate while encoding output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn remote(
        operation: &'static str,
        path: impl Into<String>,
        source: suppaftp::FtpError,
    ) -> Self {
        Error::Remote {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}
