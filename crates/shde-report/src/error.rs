//! Errors surfaced by the Reporter.

use thiserror::Error;

/// Reporter error type.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Could not write the temporary report file.
    #[error("cannot write report to '{path}': {source}")]
    WriteTemp {
        /// Temp file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not rename the temp report into place.
    #[error("cannot finalize report at '{path}': {source}")]
    Finalize {
        /// Final report path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not serialize the report.
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
