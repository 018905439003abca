//! Confidence Manager (C7): scores a candidate patch against the outcome
//! history for its signature, and gates whether the patch is worth applying
//! or retrying.
//!
//! Scoring is deterministic given a seed: base score from the historical
//! success rate, plus a small seeded jitter so two patches with identical
//! history don't tie forever.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shde_core::{AttemptOutcome, AttemptStatus, ConfidenceReason, ConfidenceRecord, Patch, Timestamp};

const JITTER: f32 = 0.05;

fn historical_success_rate(history: &[AttemptOutcome]) -> Option<f32> {
    let relevant: Vec<&AttemptOutcome> = history
        .iter()
        .filter(|o| {
            matches!(
                o.status,
                AttemptStatus::AppliedAndPassed | AttemptStatus::AppliedAndFailed
            )
        })
        .collect();
    if relevant.is_empty() {
        return None;
    }
    let passed = relevant
        .iter()
        .filter(|o| o.status == AttemptStatus::AppliedAndPassed)
        .count();
    Some(passed as f32 / relevant.len() as f32)
}

fn base_score(history: &[AttemptOutcome]) -> (f32, ConfidenceReason) {
    match historical_success_rate(history) {
        None => (0.5, ConfidenceReason::NovelPattern),
        Some(rate) if rate >= 0.8 => (0.9, ConfidenceReason::MatchesPriorSuccess),
        Some(rate) if rate <= 0.2 => (0.1, ConfidenceReason::RepeatedFailure),
        Some(rate) => (rate, ConfidenceReason::PartialHistory),
    }
}

/// Scores patches and decides whether they clear the apply/retry gates.
pub struct ConfidenceManager {
    apply_threshold: f32,
    retry_threshold: f32,
    rng: StdRng,
}

impl ConfidenceManager {
    /// Build a manager with the configured thresholds and a deterministic
    /// jitter seed.
    pub fn new(apply_threshold: f32, retry_threshold: f32, rng_seed: u64) -> Self {
        Self {
            apply_threshold,
            retry_threshold,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    /// Score `patch` given the outcome history recorded for its signature.
    pub fn assign(
        &mut self,
        patch: &Patch,
        history: &[AttemptOutcome],
        now: Timestamp,
    ) -> ConfidenceRecord {
        let (base, reason) = base_score(history);
        let jitter = self.rng.gen_range(-JITTER..=JITTER);
        let score = (base + jitter).clamp(0.1, 1.0);
        tracing::debug!(signature = %patch.signature, score, reason = %reason, "confidence assigned");
        ConfidenceRecord {
            signature: patch.signature.clone(),
            patch_digest: patch.digest(),
            score,
            reason,
            timestamp: now,
        }
    }

    /// Whether `record` clears the apply gate.
    pub fn should_apply(&self, record: &ConfidenceRecord) -> bool {
        record.score >= self.apply_threshold
    }

    /// Whether `record` clears the (lower) retry gate.
    pub fn should_retry(&self, record: &ConfidenceRecord) -> bool {
        record.score >= self.retry_threshold
    }

    /// Score every candidate and return the highest-scoring one that clears
    /// the apply gate, if any.
    pub fn best_high_confidence(
        &mut self,
        candidates: Vec<(Patch, Vec<AttemptOutcome>)>,
        now: Timestamp,
    ) -> Option<(Patch, ConfidenceRecord)> {
        let mut best: Option<(Patch, ConfidenceRecord)> = None;
        for (patch, history) in candidates {
            let record = self.assign(&patch, &history, now);
            if !self.should_apply(&record) {
                continue;
            }
            let replace = match &best {
                Some((_, best_record)) => record.score > best_record.score,
                None => true,
            };
            if replace {
                best = Some((patch, record));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::{ErrorSignature, Provenance};

    fn patch(sig: &ErrorSignature) -> Patch {
        Patch {
            diff: "diff".into(),
            targets: vec![],
            provenance: Provenance::Pattern,
            signature: sig.clone(),
        }
    }

    fn outcome(sig: &ErrorSignature, status: AttemptStatus) -> AttemptOutcome {
        AttemptOutcome {
            signature: sig.clone(),
            patch_digest: "d".into(),
            status,
            timestamp: Timestamp(0),
        }
    }

    #[test]
    fn novel_pattern_has_no_history() {
        let sig = ErrorSignature("s".into());
        let mut manager = ConfidenceManager::new(0.75, 0.20, 1);
        let record = manager.assign(&patch(&sig), &[], Timestamp(0));
        assert_eq!(record.reason, ConfidenceReason::NovelPattern);
    }

    #[test]
    fn repeated_success_scores_above_apply_threshold() {
        let sig = ErrorSignature("s".into());
        let mut manager = ConfidenceManager::new(0.75, 0.20, 7);
        let history = vec![
            outcome(&sig, AttemptStatus::AppliedAndPassed),
            outcome(&sig, AttemptStatus::AppliedAndPassed),
            outcome(&sig, AttemptStatus::AppliedAndPassed),
        ];
        let record = manager.assign(&patch(&sig), &history, Timestamp(0));
        assert_eq!(record.reason, ConfidenceReason::MatchesPriorSuccess);
        assert!(manager.should_apply(&record));
    }

    #[test]
    fn repeated_failure_scores_below_retry_threshold() {
        let sig = ErrorSignature("s".into());
        let mut manager = ConfidenceManager::new(0.75, 0.20, 7);
        let history = vec![
            outcome(&sig, AttemptStatus::AppliedAndFailed),
            outcome(&sig, AttemptStatus::AppliedAndFailed),
            outcome(&sig, AttemptStatus::AppliedAndFailed),
        ];
        let record = manager.assign(&patch(&sig), &history, Timestamp(0));
        assert_eq!(record.reason, ConfidenceReason::RepeatedFailure);
        assert!(!manager.should_retry(&record));
    }

    #[test]
    fn best_high_confidence_prefers_the_higher_scorer() {
        let sig = ErrorSignature("s".into());
        let mut manager = ConfidenceManager::new(0.75, 0.20, 3);
        let strong = vec![
            outcome(&sig, AttemptStatus::AppliedAndPassed),
            outcome(&sig, AttemptStatus::AppliedAndPassed),
        ];
        let weak = vec![
            outcome(&sig, AttemptStatus::AppliedAndFailed),
            outcome(&sig, AttemptStatus::AppliedAndFailed),
        ];
        let candidates = vec![(patch(&sig), weak), (patch(&sig), strong)];
        let (_, record) = manager.best_high_confidence(candidates, Timestamp(0)).unwrap();
        assert_eq!(record.reason, ConfidenceReason::MatchesPriorSuccess);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let sig = ErrorSignature("s".into());
        let mut manager = ConfidenceManager::new(0.75, 0.20, 42);
        for _ in 0..50 {
            let record = manager.assign(&patch(&sig), &[], Timestamp(0));
            assert!(record.score >= 0.0 && record.score <= 1.0);
        }
    }
}
