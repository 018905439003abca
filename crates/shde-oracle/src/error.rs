//! Errors surfaced by the Patch Oracle Adapter.

use thiserror::Error;

/// Patch Oracle Adapter error type. Individual provider transport failures
/// are never surfaced here — the adapter logs and falls through to the next
/// provider instead.
#[derive(Debug, Error)]
pub enum OracleError {
    /// A provider returned a diff that doesn't parse as a unified diff.
    #[error("provider '{provider}' returned an unparseable diff: {reason}")]
    InvalidDiff {
        /// Name of the offending provider.
        provider: String,
        /// Parse failure detail.
        reason: String,
    },

    /// Recording oracle feedback in the Patch Tracker failed.
    #[error("failed to record oracle feedback: {0}")]
    Tracker(#[from] shde_tracker::TrackerError),
}
