//! Patch Oracle Adapter (C6): the last escalation rung. Chains one or more
//! [`PatchOracleProvider`]s behind a fallback order and escalates the prompt
//! across repeated attempts for the same signature.
//!
//! Every invocation — successful or not — is recorded to the Patch
//! Tracker's oracle-feedback ledger, which the Reporter later summarizes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::OracleError;

use shde_core::{ErrorSignature, Failure, Patch, PatchOracleProvider, Provenance, Timestamp};
use shde_tracker::{OracleFeedbackEntry, PatchTracker};
use std::path::PathBuf;

/// Escalating hints appended to the prompt as attempts for the same
/// signature accumulate. The last entry is reused for any further attempt.
const REFINEMENT_HINTS: [&str; 3] = [
    "",
    "A previous attempt at this exact failure did not fix it. Consider edge cases the first patch may have missed.",
    "Two previous attempts at this exact failure did not fix it. Prefer the smallest possible change and double-check syntax.",
];

fn refinement_hint(attempt_index: u32) -> &'static str {
    REFINEMENT_HINTS
        .get(attempt_index as usize)
        .copied()
        .unwrap_or_else(|| REFINEMENT_HINTS[REFINEMENT_HINTS.len() - 1])
}

fn build_prompt(failure: &Failure, source: &str, attempt_index: u32) -> String {
    let hint = refinement_hint(attempt_index);
    let mut prompt = format!(
        "Test `{}` in {} failed:\n{}\n\nCurrent source:\n{}\n",
        failure.test_name,
        failure.file_path.display(),
        failure.error_message,
        source,
    );
    if !hint.is_empty() {
        prompt.push('\n');
        prompt.push_str(hint);
    }
    prompt
}

/// Extract the files a unified diff touches from its `+++` headers.
fn targets_from_diff(diff_text: &str) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix("+++ ") {
            let path = rest
                .trim()
                .trim_start_matches("b/")
                .trim_start_matches("a/");
            if path != "/dev/null" && !targets.iter().any(|p: &PathBuf| p.as_os_str() == path) {
                targets.push(PathBuf::from(path));
            }
        }
    }
    targets
}

/// Chains providers in fallback order: the first to return a parseable diff
/// wins. Transport errors and unparseable diffs just fall through to the
/// next provider.
pub struct ChainedOracle {
    providers: Vec<Box<dyn PatchOracleProvider>>,
}

impl ChainedOracle {
    /// Build an oracle from a fallback chain of providers, tried in order.
    pub fn new(providers: Vec<Box<dyn PatchOracleProvider>>) -> Self {
        Self { providers }
    }

    /// Ask the chain for a patch addressing `failure`, escalating the
    /// prompt by `attempt_index`. Records one oracle-feedback entry per
    /// provider consulted.
    pub fn propose(
        &self,
        failure: &Failure,
        source: &str,
        signature: &ErrorSignature,
        attempt_index: u32,
        tracker: &mut PatchTracker,
        now: Timestamp,
    ) -> Result<Option<Patch>, OracleError> {
        let prompt = build_prompt(failure, source, attempt_index);

        for provider in &self.providers {
            let outcome = provider.suggest_patch(&prompt);
            match outcome {
                Ok(Some(diff)) => match diffy::Patch::from_str(&diff) {
                    Ok(_) => {
                        tracker.record_oracle_feedback(OracleFeedbackEntry {
                            provider: provider.name().to_string(),
                            signature: signature.clone(),
                            attempt_index,
                            produced_patch: true,
                            note: "parsed".into(),
                            timestamp: now,
                        })?;
                        let targets = targets_from_diff(&diff);
                        return Ok(Some(Patch {
                            diff,
                            targets,
                            provenance: Provenance::Oracle,
                            signature: signature.clone(),
                        }));
                    }
                    Err(parse_err) => {
                        tracing::warn!(
                            provider = provider.name(),
                            error = %parse_err,
                            "oracle returned an unparseable diff"
                        );
                        tracker.record_oracle_feedback(OracleFeedbackEntry {
                            provider: provider.name().to_string(),
                            signature: signature.clone(),
                            attempt_index,
                            produced_patch: false,
                            note: format!("unparseable diff: {parse_err}"),
                            timestamp: now,
                        })?;
                    }
                },
                Ok(None) => {
                    tracker.record_oracle_feedback(OracleFeedbackEntry {
                        provider: provider.name().to_string(),
                        signature: signature.clone(),
                        attempt_index,
                        produced_patch: false,
                        note: "no suggestion".into(),
                        timestamp: now,
                    })?;
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "oracle provider failed");
                    tracker.record_oracle_feedback(OracleFeedbackEntry {
                        provider: provider.name().to_string(),
                        signature: signature.clone(),
                        attempt_index,
                        produced_patch: false,
                        note: format!("provider error: {e}"),
                        timestamp: now,
                    })?;
                }
            }
        }
        Ok(None)
    }
}

/// A provider with nothing to say, used to exercise the fallback chain.
pub struct NoopOracleProvider;

impl PatchOracleProvider for NoopOracleProvider {
    fn suggest_patch(&self, _prompt: &str) -> Result<Option<String>, shde_core::CoreError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// A provider that always returns the same scripted diff, for tests.
pub struct ScriptedOracleProvider {
    name: String,
    diff: String,
}

impl ScriptedOracleProvider {
    /// Build a provider that always answers with `diff`.
    pub fn new(name: impl Into<String>, diff: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diff: diff.into(),
        }
    }
}

impl PatchOracleProvider for ScriptedOracleProvider {
    fn suggest_patch(&self, _prompt: &str) -> Result<Option<String>, shde_core::CoreError> {
        Ok(Some(self.diff.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::ErrorKind;
    use std::path::PathBuf as StdPathBuf;

    fn failure() -> Failure {
        Failure {
            file_path: StdPathBuf::from("a.py"),
            test_name: "test_a".into(),
            error_kind: ErrorKind::Other("boom".into()),
            error_message: "boom".into(),
            raw_location: None,
        }
    }

    const SAMPLE_DIFF: &str = "--- a/a.py\n+++ b/a.py\n@@ -1 +1 @@\n-old\n+new\n";

    #[test]
    fn falls_through_to_the_next_provider() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = PatchTracker::open(dir.path(), 0);
        let sig = ErrorSignature("sig".into());
        let oracle = ChainedOracle::new(vec![
            Box::new(NoopOracleProvider),
            Box::new(ScriptedOracleProvider::new("scripted", SAMPLE_DIFF)),
        ]);
        let patch = oracle
            .propose(&failure(), "old\n", &sig, 0, &mut tracker, Timestamp(0))
            .unwrap();
        assert!(patch.is_some());
        assert_eq!(tracker.oracle_feedback().entries.len(), 2);
    }

    #[test]
    fn unparseable_diffs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = PatchTracker::open(dir.path(), 0);
        let sig = ErrorSignature("sig".into());
        let oracle = ChainedOracle::new(vec![Box::new(ScriptedOracleProvider::new(
            "garbage",
            "not a diff at all",
        ))]);
        let patch = oracle
            .propose(&failure(), "old\n", &sig, 0, &mut tracker, Timestamp(0))
            .unwrap();
        assert!(patch.is_none());
        assert!(!tracker.oracle_feedback().entries[0].produced_patch);
    }

    #[test]
    fn no_providers_yields_no_patch() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = PatchTracker::open(dir.path(), 0);
        let sig = ErrorSignature("sig".into());
        let oracle = ChainedOracle::new(vec![]);
        let patch = oracle
            .propose(&failure(), "old\n", &sig, 0, &mut tracker, Timestamp(0))
            .unwrap();
        assert!(patch.is_none());
    }

    #[test]
    fn refinement_hint_escalates_then_holds() {
        assert_eq!(refinement_hint(0), "");
        assert!(!refinement_hint(1).is_empty());
        assert_eq!(refinement_hint(5), refinement_hint(2));
    }
}
