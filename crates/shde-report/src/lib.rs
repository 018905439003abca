//! Reporter (C10): merges a session's recorded outcomes and confidence
//! history into a single `debugging_report.json`, and optionally forwards it
//! to an external [`shde_core::ArtifactSink`].
//!
//! A sink failure is logged and swallowed — the session's own report file is
//! always written first and is the source of truth.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::ReportError;

use serde::{Deserialize, Serialize};
use shde_core::{
    ArtifactSink, AttemptOutcome, ConfidenceRecord, ErrorSignature, SessionId, Timestamp,
};
use shde_tracker::{PatchTracker, PerformanceEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The merged record of one debug-loop session, written to
/// `debugging_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session this report covers.
    pub session_id: SessionId,
    /// When the session started.
    pub started_at: Timestamp,
    /// When the session finished.
    pub finished_at: Timestamp,
    /// Every recorded attempt outcome, in timestamp order.
    pub outcomes: Vec<AttemptOutcome>,
    /// Every confidence score assigned during the session.
    pub confidence_records: Vec<ConfidenceRecord>,
}

impl SessionReport {
    /// Group this session's outcomes by the signature they targeted.
    pub fn by_signature(&self) -> HashMap<ErrorSignature, Vec<&AttemptOutcome>> {
        let mut grouped: HashMap<ErrorSignature, Vec<&AttemptOutcome>> = HashMap::new();
        for outcome in &self.outcomes {
            grouped.entry(outcome.signature.clone()).or_default().push(outcome);
        }
        grouped
    }

    /// Count of outcomes with each status, for a quick session summary.
    pub fn resolved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, shde_core::AttemptStatus::AppliedAndPassed))
            .count()
    }

    /// Count of outcomes that ended in manual review.
    pub fn manual_review_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, shde_core::AttemptStatus::ManualReview))
            .count()
    }
}

/// Builds and persists [`SessionReport`]s.
pub struct Reporter {
    report_path: PathBuf,
}

impl Reporter {
    /// Target `data_dir/debugging_report.json`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_path: data_dir.into().join("debugging_report.json"),
        }
    }

    /// Merge every outcome and confidence record recorded so far into a
    /// [`SessionReport`] for `session_id`.
    pub fn merge(
        &self,
        tracker: &PatchTracker,
        confidence_records: Vec<ConfidenceRecord>,
        session_id: SessionId,
        started_at: Timestamp,
        finished_at: Timestamp,
    ) -> SessionReport {
        let mut outcomes: Vec<AttemptOutcome> = tracker
            .successful()
            .entries
            .values()
            .flatten()
            .cloned()
            .chain(tracker.failed().entries.values().flatten().cloned())
            .collect();
        outcomes.sort_by_key(|o| o.timestamp);

        SessionReport {
            session_id,
            started_at,
            finished_at,
            outcomes,
            confidence_records,
        }
    }

    /// Persist `report` to `debugging_report.json`, write-temp-then-rename.
    pub fn persist(&self, report: &SessionReport) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)?;
        let tmp_path = self.report_path.with_extension("json.tmp");
        std::fs::create_dir_all(self.report_path.parent().unwrap_or(Path::new(".")))
            .map_err(|source| ReportError::WriteTemp {
                path: tmp_path.display().to_string(),
                source,
            })?;
        std::fs::write(&tmp_path, json).map_err(|source| ReportError::WriteTemp {
            path: tmp_path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.report_path).map_err(|source| ReportError::Finalize {
            path: self.report_path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Forward `report` to an optional external sink. Errors are logged and
    /// swallowed, never propagated — the persisted file is authoritative.
    pub fn publish(&self, sink: &dyn ArtifactSink, report: &SessionReport) {
        let json = match serde_json::to_string(report) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize report for sink");
                return;
            }
        };
        if let Err(e) = sink.publish(&json) {
            tracing::warn!(error = %e, "artifact sink failed; report file remains authoritative");
        }
    }

    /// Today's roll-up (and all prior days) from the tracker's performance
    /// ledger, for the `performance` CLI command.
    pub fn aggregate_performance<'a>(
        &self,
        tracker: &'a PatchTracker,
    ) -> &'a std::collections::BTreeMap<String, PerformanceEntry> {
        &tracker.performance().days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::{AttemptStatus, ErrorSignature};

    fn outcome(sig: &ErrorSignature, status: AttemptStatus, ts: i64) -> AttemptOutcome {
        AttemptOutcome {
            signature: sig.clone(),
            patch_digest: "d".into(),
            status,
            timestamp: Timestamp(ts),
        }
    }

    #[test]
    fn merge_sorts_outcomes_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = PatchTracker::open(dir.path(), 0);
        let sig = ErrorSignature("sig".into());
        tracker
            .record_outcome(&sig, outcome(&sig, AttemptStatus::AppliedAndFailed, 5))
            .unwrap();
        tracker
            .record_outcome(&sig, outcome(&sig, AttemptStatus::AppliedAndPassed, 2))
            .unwrap();

        let reporter = Reporter::new(dir.path());
        let report = reporter.merge(
            &tracker,
            vec![],
            SessionId("s1".into()),
            Timestamp(0),
            Timestamp(10),
        );
        assert_eq!(report.outcomes[0].timestamp, Timestamp(2));
        assert_eq!(report.outcomes[1].timestamp, Timestamp(5));
        assert_eq!(report.resolved_count(), 1);
    }

    #[test]
    fn persist_writes_valid_json_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = PatchTracker::open(dir.path(), 0);
        let reporter = Reporter::new(dir.path());
        let report = reporter.merge(
            &tracker,
            vec![],
            SessionId("s1".into()),
            Timestamp(0),
            Timestamp(1),
        );
        reporter.persist(&report).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("debugging_report.json")).unwrap();
        let reloaded: SessionReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(reloaded.session_id, report.session_id);
    }

    #[test]
    fn by_signature_groups_outcomes() {
        let sig_a = ErrorSignature("a".into());
        let sig_b = ErrorSignature("b".into());
        let report = SessionReport {
            session_id: SessionId("s1".into()),
            started_at: Timestamp(0),
            finished_at: Timestamp(1),
            outcomes: vec![
                outcome(&sig_a, AttemptStatus::AppliedAndPassed, 1),
                outcome(&sig_b, AttemptStatus::AppliedAndFailed, 2),
                outcome(&sig_a, AttemptStatus::AppliedAndFailed, 3),
            ],
            confidence_records: vec![],
        };
        let grouped = report.by_signature();
        assert_eq!(grouped.get(&sig_a).unwrap().len(), 2);
        assert_eq!(grouped.get(&sig_b).unwrap().len(), 1);
    }
}
