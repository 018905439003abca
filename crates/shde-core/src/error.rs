//! Shared error type for the core data model and configuration layer.

use thiserror::Error;

/// Errors surfaced by `shde-core` itself (signature hashing, config loading).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `TestExecutor` port implementation failed to run.
    #[error("test executor failed: {0}")]
    Executor(String),

    /// A `PatchOracleProvider` port implementation failed.
    #[error("oracle provider failed: {0}")]
    OracleProvider(String),

    /// An `ArtifactSink` port implementation failed to publish a report.
    #[error("artifact sink failed: {0}")]
    ArtifactSink(String),

    /// Configuration file could not be read.
    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file was not valid TOML.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
