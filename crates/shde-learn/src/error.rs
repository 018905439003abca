//! Errors surfaced by the Learned-Fix Store.

use thiserror::Error;

/// Persistence errors for the Learned-Fix Store. Callers should log these
/// and reset to empty rather than propagate them.
#[derive(Debug, Error)]
pub enum LearnError {
    /// Could not create the parent directory for the store file.
    #[error("cannot create directory '{path}': {source}")]
    CreateDir {
        /// Directory that failed to create.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temp file could not be written.
    #[error("failed to write temp file '{path}': {source}")]
    WriteTemp {
        /// Temp file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temp file could not be renamed into place.
    #[error("failed to finalize store file '{path}': {source}")]
    Finalize {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization of the store failed.
    #[error("failed to serialize learned-fix store: {0}")]
    Serialize(#[source] serde_json::Error),

    /// An import source file could not be read.
    #[error("failed to read import file '{path}': {source}")]
    ReadImport {
        /// Source file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
