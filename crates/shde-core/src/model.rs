//! Entities shared across every SHDE component: `Failure`, `ErrorSignature`,
//! `Patch`, `ConfidenceRecord`, `AttemptOutcome`, `BackupSnapshot`, and
//! `LearnedFix`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// A single test-session timestamp, stored as seconds since the Unix epoch.
///
/// Never read from the system clock inside library code: callers (the CLI
/// binary, or a test harness) supply it explicitly so the rest of the crate
/// stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Wrap a raw Unix-epoch-seconds value.
    pub fn new(secs: i64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for one debug-loop session, used to scope backup snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed catalogue of error kinds the Pattern Fixer (C5) knows how to
/// handle, plus an open `Other` bucket for anything else the parser sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// `'X' object has no attribute 'y'`
    MissingAttribute {
        /// The class/type name (`X`).
        class_name: String,
        /// The missing attribute name (`y`).
        attribute: String,
    },
    /// `AssertionError: A != B`
    AssertionMismatch {
        /// The left-hand side as reported by the failure.
        expected: String,
        /// The right-hand side as reported by the failure (the observed value).
        actual: String,
    },
    /// `No module named 'm'`
    ImportError {
        /// The missing module name (`m`).
        module: String,
    },
    /// `f() missing N required positional arguments`
    TypeErrorMissingArgs {
        /// Name of the callee.
        callee: String,
        /// Number of missing positional arguments.
        count: usize,
    },
    /// A raw indentation error (tabs mixed with spaces).
    IndentationError,
    /// Anything the parser could not classify into the catalogue above.
    Other(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute {
                class_name,
                attribute,
            } => write!(f, "missing_attribute({class_name}.{attribute})"),
            Self::AssertionMismatch { expected, actual } => {
                write!(f, "assertion_mismatch({expected} != {actual})")
            }
            Self::ImportError { module } => write!(f, "import_error({module})"),
            Self::TypeErrorMissingArgs { callee, count } => {
                write!(f, "missing_args({callee}, {count})")
            }
            Self::IndentationError => write!(f, "indentation_error"),
            Self::Other(raw) => write!(f, "other({raw})"),
        }
    }
}

/// A parsed test failure, produced by the Failure Parser (C1). Immutable
/// once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// File the failing test lives in.
    pub file_path: PathBuf,
    /// Name of the failing test.
    pub test_name: String,
    /// Classified error kind.
    pub error_kind: ErrorKind,
    /// Raw error message as reported by the executor.
    pub error_message: String,
    /// Raw location string from executor output, if present (e.g. `file.py:42`).
    pub raw_location: Option<String>,
}

/// Deterministic identifier for "the same error": a hash of the normalized
/// error message and normalized code context. Two failures with the same
/// signature are treated as the same problem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorSignature(pub String);

impl ErrorSignature {
    /// Compute a reproducible signature from an error message and the
    /// surrounding code context. Whitespace is normalized and line numbers
    /// are stripped so the same logical error at a shifted line still
    /// collides.
    pub fn compute(error_message: &str, code_context: &str) -> Self {
        let normalized_message = normalize(error_message);
        let normalized_context = normalize(code_context);
        let mut hasher = Sha256::new();
        hasher.update(normalized_message.as_bytes());
        hasher.update(b"\0");
        hasher.update(normalized_context.as_bytes());
        let digest = hasher.finalize();
        Self(format!("{digest:x}"))
    }
}

impl fmt::Display for ErrorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip digit runs (line/column numbers) and collapse whitespace so that
/// signatures survive cosmetic shifts in source location.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            out.push('#');
            while matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
                chars.next();
            }
            last_was_space = false;
            continue;
        }
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        out.push(c);
        last_was_space = false;
    }
    out.trim().to_string()
}

/// Origin of a candidate patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Came from the Learned-Fix Store.
    Learned,
    /// Came from the Pattern Fixer.
    Pattern,
    /// Came from the Patch Oracle Adapter.
    Oracle,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Learned => "learned",
            Self::Pattern => "pattern",
            Self::Oracle => "oracle",
        };
        write!(f, "{s}")
    }
}

/// A unified-diff artifact targeting one or more files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Unified diff text.
    pub diff: String,
    /// Files this patch touches.
    pub targets: Vec<PathBuf>,
    /// Where this patch came from.
    pub provenance: Provenance,
    /// The error signature this patch was generated for.
    pub signature: ErrorSignature,
}

impl Patch {
    /// Stable digest identifying this patch's content, used as the second
    /// half of a `(signature, patch)` key in confidence and ledger records.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.diff.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Fixed enumerated reasons behind a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceReason {
    /// High base score: this patch (or one like it) has succeeded before.
    MatchesPriorSuccess,
    /// No history at all for this signature.
    NovelPattern,
    /// Some history, but a mixed success rate.
    PartialHistory,
    /// History dominated by failures for this signature.
    RepeatedFailure,
}

impl fmt::Display for ConfidenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MatchesPriorSuccess => "matches a prior success",
            Self::NovelPattern => "novel pattern, uncertain",
            Self::PartialHistory => "mixed prior history",
            Self::RepeatedFailure => "repeated prior failure",
        };
        write!(f, "{s}")
    }
}

/// `{ signature, patch, score, reason, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceRecord {
    /// Signature this confidence score was computed for.
    pub signature: ErrorSignature,
    /// Digest of the patch this score applies to.
    pub patch_digest: String,
    /// Score in `[0, 1]`.
    pub score: f32,
    /// Human-readable reason for the score.
    pub reason: ConfidenceReason,
    /// When this record was produced.
    pub timestamp: Timestamp,
}

/// Outcome of a single apply-and-revalidate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Patch applied, re-run passed.
    AppliedAndPassed,
    /// Patch applied, re-run still failed.
    AppliedAndFailed,
    /// Patch was never applied because the Confidence Manager rejected it.
    RejectedByGate,
    /// Patch was applied, failed, and has since been rolled back.
    RolledBack,
    /// Signature exhausted its retry budget without a passing patch.
    ManualReview,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AppliedAndPassed => "APPLIED_AND_PASSED",
            Self::AppliedAndFailed => "APPLIED_AND_FAILED",
            Self::RejectedByGate => "REJECTED_BY_GATE",
            Self::RolledBack => "ROLLED_BACK",
            Self::ManualReview => "MANUAL_REVIEW",
        };
        write!(f, "{s}")
    }
}

/// `{ signature, patch, status, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Signature this attempt targeted.
    pub signature: ErrorSignature,
    /// Digest of the patch that was attempted.
    pub patch_digest: String,
    /// What happened.
    pub status: AttemptStatus,
    /// When it happened.
    pub timestamp: Timestamp,
}

/// A known-good patch for a signature, reinforced on repeated success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedFix {
    /// Signature this fix resolves.
    pub signature: ErrorSignature,
    /// The patch itself.
    pub patch: Patch,
    /// How many times this patch has produced `AppliedAndPassed`.
    pub success_count: u32,
    /// Most recent time this fix was used.
    pub last_used: Timestamp,
}
