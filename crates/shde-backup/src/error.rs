//! Errors surfaced by the Backup Vault. Any variant here represents a
//! mutation attempted without a prior backup, an invariant violation that
//! should abort the session rather than be locally recovered.

use thiserror::Error;

/// Backup Vault error type.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Could not read the file being snapshotted.
    #[error("cannot read '{path}' to create backup: {source}")]
    ReadOriginal {
        /// File that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not write the snapshot to the backup directory.
    #[error("cannot write backup for '{path}': {source}")]
    WriteSnapshot {
        /// File the snapshot is for.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not write the snapshot manifest.
    #[error("cannot write backup manifest: {0}")]
    WriteManifest(#[source] std::io::Error),

    /// Restore was requested for a file with no held snapshot.
    #[error("no backup held for '{0}'; mutation without a prior snapshot is an invariant violation")]
    NoSnapshot(String),

    /// Could not write the restored bytes back to the original path.
    #[error("cannot restore '{path}': {source}")]
    WriteRestored {
        /// File being restored.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Could not remove a session's backup directory on commit.
    #[error("cannot remove session backup directory '{path}': {source}")]
    RemoveSessionDir {
        /// Directory path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
