//! Patch Tracker (C3): five append-only ledgers recording every patch
//! attempt, import fix, oracle invocation, and daily performance roll-up.
//!
//! Guarantees: crash-safe append via write-temp-then-rename; ledger files
//! are always valid JSON on disk; a corrupt file is quarantined (renamed
//! with a timestamp suffix) and replaced with an empty ledger rather than
//! raised as an error.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod ledgers;
mod persist;

pub use error::TrackerError;
pub use ledgers::{
    ImportFixCounts, ImportFixLedger, OracleFeedbackEntry, OracleFeedbackLedger, OutcomeLedger,
    PerformanceEntry, PerformanceLedger,
};

use shde_core::{AttemptOutcome, AttemptStatus, ErrorSignature};
use std::path::{Path, PathBuf};

/// Owns `patch_data/{failed,successful}_patches.json`,
/// `patch_data/import_fixes.json`, `patch_data/oracle_feedback.json`, and
/// `patch_data/performance.json`.
pub struct PatchTracker {
    dir: PathBuf,
    failed: OutcomeLedger,
    successful: OutcomeLedger,
    import_fixes: ImportFixLedger,
    oracle_feedback: OracleFeedbackLedger,
    performance: PerformanceLedger,
}

fn path_for(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

impl PatchTracker {
    /// Open (or lazily create) all five ledgers under `data_dir/patch_data`.
    pub fn open(data_dir: impl Into<PathBuf>, now_secs: i64) -> Self {
        let dir = data_dir.into().join("patch_data");
        Self {
            failed: persist::load_or_quarantine(&path_for(&dir, "failed_patches.json"), now_secs),
            successful: persist::load_or_quarantine(
                &path_for(&dir, "successful_patches.json"),
                now_secs,
            ),
            import_fixes: persist::load_or_quarantine(
                &path_for(&dir, "import_fixes.json"),
                now_secs,
            ),
            oracle_feedback: persist::load_or_quarantine(
                &path_for(&dir, "oracle_feedback.json"),
                now_secs,
            ),
            performance: persist::load_or_quarantine(&path_for(&dir, "performance.json"), now_secs),
            dir,
        }
    }

    /// Append an outcome to the correct ledger based on its status, and
    /// persist immediately (ledgers are append-only; never mutated after
    /// the fact).
    pub fn record_outcome(
        &mut self,
        signature: &ErrorSignature,
        outcome: AttemptOutcome,
    ) -> Result<(), TrackerError> {
        match outcome.status {
            AttemptStatus::AppliedAndPassed => {
                self.successful.append(signature, outcome);
                persist::write_atomic(
                    &path_for(&self.dir, "successful_patches.json"),
                    &self.successful,
                )
            }
            _ => {
                self.failed.append(signature, outcome);
                persist::write_atomic(&path_for(&self.dir, "failed_patches.json"), &self.failed)
            }
        }
    }

    /// All recorded outcomes (successful and failed) for `signature`, in
    /// append order.
    pub fn outcomes_for(&self, signature: &ErrorSignature) -> Vec<&AttemptOutcome> {
        let mut outcomes: Vec<&AttemptOutcome> = self
            .successful
            .for_signature(signature)
            .iter()
            .chain(self.failed.for_signature(signature).iter())
            .collect();
        outcomes.sort_by_key(|o| o.timestamp);
        outcomes
    }

    /// Record that an import-fix attempt for `module` succeeded or failed.
    pub fn record_import_fix(&mut self, module: &str, fixed: bool) -> Result<(), TrackerError> {
        if fixed {
            self.import_fixes.record_fixed(module);
        } else {
            self.import_fixes.record_failed(module);
        }
        persist::write_atomic(&path_for(&self.dir, "import_fixes.json"), &self.import_fixes)
    }

    /// Append one oracle-invocation record.
    pub fn record_oracle_feedback(&mut self, entry: OracleFeedbackEntry) -> Result<(), TrackerError> {
        self.oracle_feedback.append(entry);
        persist::write_atomic(
            &path_for(&self.dir, "oracle_feedback.json"),
            &self.oracle_feedback,
        )
    }

    /// Roll up today's totals into `performance.json` under `date`
    /// (`YYYY-MM-DD`).
    pub fn record_performance(&mut self, date: &str) -> Result<(), TrackerError> {
        let total_fixes = self.successful.total_entries() as u32 + self.failed.total_entries() as u32;
        let successes = self.successful.total_entries() as u32;
        let feedback_summary = format!(
            "{} oracle invocations recorded",
            self.oracle_feedback.entries.len()
        );
        self.performance
            .record_day(date, total_fixes, successes, feedback_summary);
        persist::write_atomic(&path_for(&self.dir, "performance.json"), &self.performance)
    }

    /// Read-only view of the performance roll-up, for the `performance` CLI
    /// command and the Reporter.
    pub fn performance(&self) -> &PerformanceLedger {
        &self.performance
    }

    /// Read-only view of import-fix counts, for the `fix-imports` CLI
    /// command.
    pub fn import_fixes(&self) -> &ImportFixLedger {
        &self.import_fixes
    }

    /// Read-only view of recorded oracle feedback, for the Reporter.
    pub fn oracle_feedback(&self) -> &OracleFeedbackLedger {
        &self.oracle_feedback
    }

    /// Read-only view of the failed-patch ledger, for the Reporter.
    pub fn failed(&self) -> &OutcomeLedger {
        &self.failed
    }

    /// Read-only view of the successful-patch ledger, for the Reporter.
    pub fn successful(&self) -> &OutcomeLedger {
        &self.successful
    }
}
