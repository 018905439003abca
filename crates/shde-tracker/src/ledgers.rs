//! Document shapes for the five ledgers persisted under `patch_data/`.

use serde::{Deserialize, Serialize};
use shde_core::{AttemptOutcome, ErrorSignature, Timestamp};
use std::collections::HashMap;

/// `patch_data/failed_patches.json` and `patch_data/successful_patches.json`:
/// `signature -> [AttemptOutcome...]`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutcomeLedger {
    #[serde(default)]
    pub entries: HashMap<String, Vec<AttemptOutcome>>,
}

impl OutcomeLedger {
    pub fn append(&mut self, signature: &ErrorSignature, outcome: AttemptOutcome) {
        self.entries.entry(signature.0.clone()).or_default().push(outcome);
    }

    pub fn for_signature(&self, signature: &ErrorSignature) -> &[AttemptOutcome] {
        self.entries
            .get(&signature.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// `patch_data/import_fixes.json`: `module_name -> {fixed, failed}`.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct ImportFixCounts {
    pub fixed: u32,
    pub failed: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ImportFixLedger {
    #[serde(default)]
    pub modules: HashMap<String, ImportFixCounts>,
}

impl ImportFixLedger {
    pub fn record_fixed(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default().fixed += 1;
    }

    pub fn record_failed(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default().failed += 1;
    }
}

/// One entry in `patch_data/oracle_feedback.json`: a single invocation of
/// the Patch Oracle Adapter, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleFeedbackEntry {
    pub provider: String,
    pub signature: ErrorSignature,
    pub attempt_index: u32,
    pub produced_patch: bool,
    pub note: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OracleFeedbackLedger {
    #[serde(default)]
    pub entries: Vec<OracleFeedbackEntry>,
}

impl OracleFeedbackLedger {
    pub fn append(&mut self, entry: OracleFeedbackEntry) {
        self.entries.push(entry);
    }
}

/// One day's roll-up in `patch_data/performance.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub total_fixes: u32,
    pub success_rate: f64,
    pub feedback_summary: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PerformanceLedger {
    #[serde(default)]
    pub days: std::collections::BTreeMap<String, PerformanceEntry>,
}

impl PerformanceLedger {
    pub fn record_day(&mut self, date: &str, total_fixes: u32, successes: u32, feedback_summary: String) {
        let success_rate = if total_fixes == 0 {
            0.0
        } else {
            f64::from(successes) / f64::from(total_fixes)
        };
        self.days.insert(
            date.to_string(),
            PerformanceEntry {
                total_fixes,
                success_rate,
                feedback_summary,
            },
        );
    }
}
