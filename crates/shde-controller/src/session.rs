//! The debug loop itself: run the suite, triage failures, escalate through
//! learned-fix / pattern-fix / oracle-fix candidates gated by confidence,
//! apply and revalidate, roll back and retry on failure, and abandon to
//! manual review once the retry budget is spent.

use crate::error::ControllerError;
use crate::state::SessionState;
use shde_backup::BackupVault;
use shde_confidence::ConfidenceManager;
use shde_core::{
    ConfidenceRecord, ErrorSignature, Failure, Patch, PatchOracleProvider, Provenance, SessionId,
    ShdeConfig, TestExecutor, Timestamp,
};
use shde_learn::LearnedFixStore;
use shde_oracle::ChainedOracle;
use shde_patterns::PatternFixer;
use shde_report::{Reporter, SessionReport};
use shde_rollback::{RollbackManager, RollbackOutcome};
use shde_tracker::PatchTracker;
use std::path::{Path, PathBuf};

/// One run of the debug loop over a project checkout.
pub struct DebugSession<'a> {
    executor: &'a dyn TestExecutor,
    project_root: PathBuf,
    config: ShdeConfig,
    session_id: SessionId,
    state: SessionState,

    learn: LearnedFixStore,
    tracker: PatchTracker,
    vault: BackupVault,
    rollback: RollbackManager,
    patterns: PatternFixer,
    confidence: ConfidenceManager,
    oracle: ChainedOracle,
    reporter: Reporter,

    confidence_records: Vec<ConfidenceRecord>,
}

impl<'a> DebugSession<'a> {
    /// Wire up every collaborator from `config` and open persistent state
    /// under `config.data_dir`.
    pub fn new(
        executor: &'a dyn TestExecutor,
        project_root: impl Into<PathBuf>,
        config: ShdeConfig,
        session_id: SessionId,
        oracle_providers: Vec<Box<dyn PatchOracleProvider>>,
        now: Timestamp,
    ) -> Self {
        let data_dir = config.data_dir.clone();
        Self {
            executor,
            project_root: project_root.into(),
            learn: LearnedFixStore::open(data_dir.join("learning_db.json")),
            tracker: PatchTracker::open(&data_dir, now.0),
            vault: BackupVault::new(&data_dir),
            rollback: RollbackManager::new(config.max_retries),
            patterns: PatternFixer::new(),
            confidence: ConfidenceManager::new(
                config.apply_threshold,
                config.retry_threshold,
                config.rng_seed,
            ),
            oracle: ChainedOracle::new(oracle_providers),
            reporter: Reporter::new(&data_dir),
            config,
            session_id,
            state: SessionState::Idle,
            confidence_records: Vec::new(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::info!(session = %self.session_id, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn read_source(&self, file_path: &Path) -> String {
        std::fs::read_to_string(self.project_root.join(file_path)).unwrap_or_default()
    }

    fn signature_for(&self, failure: &Failure) -> ErrorSignature {
        let context = self.read_source(&failure.file_path);
        ErrorSignature::compute(&failure.error_message, &context)
    }

    /// Run the full session: repeated suite runs, each followed by
    /// triage-and-escalate for every distinct failure, until the suite
    /// passes, the session retry budget is spent, or nothing further can be
    /// done. Returns the merged report and the terminal state.
    pub fn run(mut self, now: Timestamp) -> Result<(SessionReport, SessionState), ControllerError> {
        self.transition(SessionState::Running);
        let mut final_state = SessionState::Aborted;

        for round in 0..self.config.session_max_retries.max(1) {
            tracing::debug!(round, "starting suite round");
            let output = self.executor.run(None)?;
            if output.succeeded() {
                final_state = SessionState::Success;
                break;
            }

            self.transition(SessionState::Triaging);
            let failures = shde_parser::parse(&output.combined_output());
            if failures.is_empty() {
                // Suite failed but produced nothing the parser recognizes:
                // there's nothing actionable left to try.
                final_state = SessionState::Aborted;
                break;
            }

            let mut all_resolved = true;
            for failure in &failures {
                let resolved = self.handle_failure(failure, now)?;
                all_resolved &= resolved;
            }

            final_state = if all_resolved {
                SessionState::Success
            } else {
                SessionState::Partial
            };

            // Either confirm an all-resolved round with one more full run,
            // or give a still-failing round another attempt — both cases
            // just let the loop continue into the next round within budget.
        }

        if final_state == SessionState::Success {
            self.vault.commit_session(&self.session_id)?;
        } else if final_state == SessionState::Aborted {
            self.vault.abort_session(&self.session_id)?;
        } else {
            // Partial: keep whatever passed, but any target still holding an
            // open (never-resolved) backup represents a reverted file already
            // restored by the rollback manager, so committing just releases
            // bookkeeping.
            self.vault.commit_session(&self.session_id)?;
        }
        self.transition(final_state);

        let date = chrono::DateTime::from_timestamp(now.0, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown-date".to_string());
        self.tracker.record_performance(&date)?;
        let report = self.reporter.merge(
            &self.tracker,
            std::mem::take(&mut self.confidence_records),
            self.session_id.clone(),
            now,
            now,
        );
        self.reporter.persist(&report)?;

        Ok((report, final_state))
    }

    /// Escalate through candidate patches for one failure until one
    /// revalidates, or every stage (and the rollback retry budget) is spent.
    /// Returns whether the failure was resolved.
    fn handle_failure(&mut self, failure: &Failure, now: Timestamp) -> Result<bool, ControllerError> {
        let signature = self.signature_for(failure);
        let total_stages = self.config.max_attempts + self.config.max_retries;

        for attempt_index in 0..total_stages {
            self.transition(SessionState::Escalating);
            let candidate = if attempt_index < self.config.max_attempts {
                self.escalate(failure, &signature, attempt_index, now)?
            } else {
                self.rollback.next_retry_candidate(&signature)
            };

            let Some(patch) = candidate else {
                break;
            };

            let history: Vec<_> = self
                .tracker
                .outcomes_for(&signature)
                .into_iter()
                .cloned()
                .collect();
            let record = self.confidence.assign(&patch, &history, now);
            self.confidence_records.push(record.clone());

            if patch.provenance == Provenance::Oracle
                && record.score < self.config.validation_min_score
            {
                tracing::debug!(
                    signature = %signature,
                    score = record.score,
                    threshold = self.config.validation_min_score,
                    "oracle patch rejected below validation threshold"
                );
                self.tracker.record_outcome(
                    &signature,
                    shde_core::AttemptOutcome {
                        signature: signature.clone(),
                        patch_digest: patch.digest(),
                        status: shde_core::AttemptStatus::RejectedByGate,
                        timestamp: now,
                    },
                )?;
                continue;
            }

            if !self.confidence.should_apply(&record) {
                tracing::debug!(signature = %signature, score = record.score, "patch rejected by confidence gate");
                self.tracker.record_outcome(
                    &signature,
                    shde_core::AttemptOutcome {
                        signature: signature.clone(),
                        patch_digest: patch.digest(),
                        status: shde_core::AttemptStatus::RejectedByGate,
                        timestamp: now,
                    },
                )?;
                continue;
            }

            if self.apply_and_revalidate(&patch, &signature, now)? {
                return Ok(true);
            }

            if self.rollback.decide(&signature) == RollbackOutcome::ManualReview
                && attempt_index + 1 >= self.config.max_attempts
            {
                break;
            }
        }

        self.transition(SessionState::Abandoning);
        self.rollback.abandon(&mut self.tracker, &signature, now)?;
        Ok(false)
    }

    /// Pick the next candidate patch for `signature`, trying (in order)
    /// the Learned-Fix Store, the Pattern Fixer, then the Patch Oracle
    /// Adapter.
    fn escalate(
        &mut self,
        failure: &Failure,
        signature: &ErrorSignature,
        attempt_index: u32,
        now: Timestamp,
    ) -> Result<Option<Patch>, ControllerError> {
        if attempt_index == 0 {
            if let Some(fix) = self.learn.lookup(signature) {
                return Ok(Some(fix.patch.clone()));
            }
        }

        if attempt_index == 1 {
            let source = self.read_source(&failure.file_path);
            if let Some(rewritten) = self.patterns.propose(&source, failure) {
                let diff = diffy::create_patch(&source, &rewritten).to_string();
                return Ok(Some(Patch {
                    diff,
                    targets: vec![failure.file_path.clone()],
                    provenance: Provenance::Pattern,
                    signature: signature.clone(),
                }));
            }
        }

        if attempt_index >= 2 {
            let source = self.read_source(&failure.file_path);
            let oracle_attempt = attempt_index - 2;
            return Ok(self.oracle.propose(
                failure,
                &source,
                signature,
                oracle_attempt,
                &mut self.tracker,
                now,
            )?);
        }

        Ok(None)
    }

    /// Back up `patch`'s targets, write the patch, re-run the suite scoped
    /// to those targets, and record the outcome. Rolls the files back on
    /// failure. Returns whether the patch resolved the failure.
    fn apply_and_revalidate(
        &mut self,
        patch: &Patch,
        signature: &ErrorSignature,
        now: Timestamp,
    ) -> Result<bool, ControllerError> {
        self.transition(SessionState::Applying);
        let mut absolute_targets = Vec::with_capacity(patch.targets.len());
        for target in &patch.targets {
            let absolute = self.project_root.join(target);
            self.vault.ensure_backup(&self.session_id, &absolute)?;
            self.write_patch(&absolute, patch)?;
            absolute_targets.push(absolute);
        }

        self.transition(SessionState::Revalidating);
        let target_refs: Vec<&Path> = absolute_targets.iter().map(PathBuf::as_path).collect();
        let output = self.executor.run(Some(&target_refs))?;

        if output.succeeded() {
            self.tracker.record_outcome(
                signature,
                shde_core::AttemptOutcome {
                    signature: signature.clone(),
                    patch_digest: patch.digest(),
                    status: shde_core::AttemptStatus::AppliedAndPassed,
                    timestamp: now,
                },
            )?;
            match patch.provenance {
                Provenance::Learned => self.learn.reinforce(signature, now)?,
                _ => self.learn.upsert(signature.clone(), patch.clone(), now)?,
            }
            return Ok(true);
        }

        self.transition(SessionState::Reverting);
        self.rollback
            .on_patch_failed(&self.session_id, &mut self.vault, &mut self.tracker, patch, now)?;
        Ok(false)
    }

    fn write_patch(&self, target: &Path, patch: &Patch) -> Result<(), ControllerError> {
        let original = std::fs::read_to_string(target).map_err(|source| ControllerError::TargetIo {
            path: target.display().to_string(),
            source,
        })?;
        let parsed = diffy::Patch::from_str(&patch.diff).map_err(|e| ControllerError::ApplyPatch {
            path: target.display().to_string(),
            reason: e.to_string(),
        })?;
        let patched = diffy::apply(&original, &parsed).map_err(|e| ControllerError::ApplyPatch {
            path: target.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(target, patched).map_err(|source| ControllerError::TargetIo {
            path: target.display().to_string(),
            source,
        })
    }
}
