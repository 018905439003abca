//! Errors surfaced by the Debug Loop Controller. Mostly a thin wrapper over
//! every collaborator's own error type, since the controller's own logic is
//! orchestration, not I/O.

use thiserror::Error;

/// Controller error type.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The test executor failed to run at all (not a test failure — a
    /// failure to invoke the suite).
    #[error("test executor failed: {0}")]
    Executor(#[from] shde_core::CoreError),

    /// Learned-Fix Store I/O failure.
    #[error("learned-fix store error: {0}")]
    Learn(#[from] shde_learn::LearnError),

    /// Patch Tracker I/O failure.
    #[error("patch tracker error: {0}")]
    Tracker(#[from] shde_tracker::TrackerError),

    /// Backup Vault failure.
    #[error("backup vault error: {0}")]
    Backup(#[from] shde_backup::BackupError),

    /// Rollback Manager failure.
    #[error("rollback manager error: {0}")]
    Rollback(#[from] shde_rollback::RollbackError),

    /// Patch Oracle Adapter failure.
    #[error("patch oracle error: {0}")]
    Oracle(#[from] shde_oracle::OracleError),

    /// Reporter failure.
    #[error("reporter error: {0}")]
    Report(#[from] shde_report::ReportError),

    /// A patch's diff could not be parsed or applied to its target.
    #[error("cannot apply patch to '{path}': {reason}")]
    ApplyPatch {
        /// Target file.
        path: String,
        /// Failure detail.
        reason: String,
    },

    /// Could not read or write a target file while applying a patch.
    #[error("cannot access '{path}': {source}")]
    TargetIo {
        /// Target file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
