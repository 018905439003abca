//! The debug-loop session state machine. States are primarily for
//! observability (logged at each transition) and for the terminal value
//! returned to the caller; the control flow itself lives in [`super::session`].

use std::fmt;

/// Where a debug-loop session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not yet started.
    Idle,
    /// Running the test suite.
    Running,
    /// Parsing and classifying failures from the last run.
    Triaging,
    /// Selecting the next candidate patch for a failing signature.
    Escalating,
    /// Writing a candidate patch to its target files.
    Applying,
    /// Re-running the suite (or the affected targets) to validate a patch.
    Revalidating,
    /// Restoring target files after a patch failed to validate.
    Reverting,
    /// A signature has exhausted its retry budget; handing off for manual
    /// review.
    Abandoning,
    /// Terminal: every failure was resolved.
    Success,
    /// Terminal: some failures were resolved, at least one was not.
    Partial,
    /// Terminal: the session was aborted (executor failure, or nothing
    /// salvageable) and every mutation was rolled back.
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Triaging => "TRIAGING",
            Self::Escalating => "ESCALATING",
            Self::Applying => "APPLYING",
            Self::Revalidating => "REVALIDATING",
            Self::Reverting => "REVERTING",
            Self::Abandoning => "ABANDONING",
            Self::Success => "SUCCESS",
            Self::Partial => "PARTIAL",
            Self::Aborted => "ABORTED",
        };
        write!(f, "{s}")
    }
}

impl SessionState {
    /// Whether this is one of the three terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Partial | Self::Aborted)
    }
}
