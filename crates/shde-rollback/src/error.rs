//! Errors surfaced by the Rollback Manager.

use thiserror::Error;

/// Rollback Manager errors. Wraps the Backup Vault's and Patch Tracker's
/// errors since restoring and recording an outcome are the only two things
/// this component does.
#[derive(Debug, Error)]
pub enum RollbackError {
    /// Restoring a file from the Backup Vault failed.
    #[error("restore failed: {0}")]
    Backup(#[from] shde_backup::BackupError),

    /// Recording the outcome in the Patch Tracker failed.
    #[error("failed to record outcome: {0}")]
    Tracker(#[from] shde_tracker::TrackerError),
}
