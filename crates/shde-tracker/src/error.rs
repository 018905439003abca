//! Errors surfaced by the Patch Tracker.

use thiserror::Error;

/// Tracker errors. Ledger corruption is recovered by quarantining the file
/// and starting empty — callers should not treat a
/// `LedgerCorrupt` observation (surfaced only via `tracing::warn!`) as fatal.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Could not create the ledger directory.
    #[error("cannot create ledger directory '{path}': {source}")]
    CreateDir {
        /// Directory path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not write the ledger's temp file.
    #[error("failed to write ledger temp file '{path}': {source}")]
    WriteTemp {
        /// Temp file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not rename the temp file into place.
    #[error("failed to finalize ledger '{path}': {source}")]
    Finalize {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization of a ledger failed.
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[source] serde_json::Error),
}
