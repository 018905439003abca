//! Rollback Manager (C8): on patch failure, restores the targeted files
//! via the Backup Vault and records an `APPLIED_AND_FAILED` outcome.
//! Before a signature is abandoned, re-tries previously failed patches in
//! reverse original order up to `MAX_RETRIES`, to catch interaction bugs
//! with concurrently applied fixes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::RollbackError;

use shde_backup::BackupVault;
use shde_core::{AttemptOutcome, AttemptStatus, ErrorSignature, Patch, SessionId, Timestamp};
use shde_tracker::PatchTracker;
use std::collections::HashMap;

/// What the Rollback Manager decided after exhausting (or not) its retry
/// budget for a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// There is still a previously failed patch worth re-trying.
    RetryCandidateAvailable,
    /// The retry budget for this signature is exhausted.
    ManualReview,
}

/// Orchestrates per-file backup/restore and cross-patch retry ordering.
pub struct RollbackManager {
    max_retries: u32,
    /// Patches already tried (and failed) for each signature, in original
    /// try order.
    tried: HashMap<ErrorSignature, Vec<Patch>>,
    /// How many alternate-order retries have been spent per signature.
    retries_spent: HashMap<ErrorSignature, u32>,
}

impl RollbackManager {
    /// Create a manager with the given `MAX_RETRIES` budget.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            tried: HashMap::new(),
            retries_spent: HashMap::new(),
        }
    }

    /// Restore the patch's target files, record an `APPLIED_AND_FAILED`
    /// outcome, and remember the patch for later alternate-order retrying.
    pub fn on_patch_failed(
        &mut self,
        session: &SessionId,
        vault: &mut BackupVault,
        tracker: &mut PatchTracker,
        patch: &Patch,
        now: Timestamp,
    ) -> Result<(), RollbackError> {
        for target in &patch.targets {
            vault.restore(session, target)?;
        }
        tracker.record_outcome(
            &patch.signature,
            AttemptOutcome {
                signature: patch.signature.clone(),
                patch_digest: patch.digest(),
                status: AttemptStatus::AppliedAndFailed,
                timestamp: now,
            },
        )?;
        self.tried
            .entry(patch.signature.clone())
            .or_default()
            .push(patch.clone());
        Ok(())
    }

    /// Returns the next previously-failed patch to re-try for `signature`,
    /// walking the try history in reverse order, bounded by `MAX_RETRIES`.
    /// Returns `None` once the budget is exhausted.
    pub fn next_retry_candidate(&mut self, signature: &ErrorSignature) -> Option<Patch> {
        let spent = self.retries_spent.entry(signature.clone()).or_insert(0);
        if *spent >= self.max_retries {
            return None;
        }
        let history = self.tried.get(signature)?;
        let index = history.len().checked_sub(1 + *spent as usize)?;
        *spent += 1;
        history.get(index).cloned()
    }

    /// Whether `signature` still has budget left for an alternate-order
    /// retry.
    pub fn decide(&self, signature: &ErrorSignature) -> RollbackOutcome {
        let spent = self.retries_spent.get(signature).copied().unwrap_or(0);
        let tried_count = self.tried.get(signature).map(Vec::len).unwrap_or(0);
        if spent >= self.max_retries || spent as usize >= tried_count {
            RollbackOutcome::ManualReview
        } else {
            RollbackOutcome::RetryCandidateAvailable
        }
    }

    /// Mark `signature` as having exhausted its rollback budget, recording
    /// a terminal `MANUAL_REVIEW` outcome.
    pub fn abandon(
        &self,
        tracker: &mut PatchTracker,
        signature: &ErrorSignature,
        now: Timestamp,
    ) -> Result<(), RollbackError> {
        tracker.record_outcome(
            signature,
            AttemptOutcome {
                signature: signature.clone(),
                patch_digest: String::new(),
                status: AttemptStatus::ManualReview,
                timestamp: now,
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::Provenance;
    use std::path::PathBuf;

    fn patch(signature: &ErrorSignature, diff: &str) -> Patch {
        Patch {
            diff: diff.to_string(),
            targets: vec![],
            provenance: Provenance::Pattern,
            signature: signature.clone(),
        }
    }

    #[test]
    fn retry_candidates_come_in_reverse_order() {
        let sig = ErrorSignature("sig".into());
        let mut manager = RollbackManager::new(3);
        let data_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let mut tracker = PatchTracker::open(data_dir.path(), 0);
        let session = SessionId("s1".into());

        let p1 = patch(&sig, "diff-1");
        let p2 = patch(&sig, "diff-2");
        manager
            .on_patch_failed(&session, &mut vault, &mut tracker, &p1, Timestamp(1))
            .unwrap();
        manager
            .on_patch_failed(&session, &mut vault, &mut tracker, &p2, Timestamp(2))
            .unwrap();

        assert_eq!(manager.next_retry_candidate(&sig), Some(p2));
        assert_eq!(manager.next_retry_candidate(&sig), Some(p1));
        assert_eq!(manager.next_retry_candidate(&sig), None);
    }

    #[test]
    fn decide_reports_manual_review_once_budget_exhausted() {
        let sig = ErrorSignature("sig".into());
        let mut manager = RollbackManager::new(1);
        let data_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let mut tracker = PatchTracker::open(data_dir.path(), 0);
        let session = SessionId("s1".into());
        let p1 = patch(&sig, "diff-1");
        manager
            .on_patch_failed(&session, &mut vault, &mut tracker, &p1, Timestamp(1))
            .unwrap();

        assert_eq!(manager.decide(&sig), RollbackOutcome::RetryCandidateAvailable);
        manager.next_retry_candidate(&sig);
        assert_eq!(manager.decide(&sig), RollbackOutcome::ManualReview);
    }
}
