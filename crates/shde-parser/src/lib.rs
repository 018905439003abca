//! Failure Parser (C1): turns a test executor's combined stdout+stderr into
//! a finite, ordered sequence of `Failure` records.
//!
//! Matching strategy: a primary anchored pattern extracts
//! `file::test – message`; when that doesn't match a line, a secondary
//! line-scan captures `FAILED` lines and splits on ` - `. Duplicate
//! failures (same file + test + message) collapse, keeping first-appearance
//! order.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod classify;

pub use classify::classify;

use regex::Regex;
use shde_core::Failure;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

fn anchored_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<file>[^\s:]+)::(?P<test>[^\s]+)\s*[-\u{2013}]\s*(?P<message>.+)$").unwrap())
}

fn failed_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^FAILED\s+(?P<rest>.+)$").unwrap())
}

/// Parse raw executor output into a deduplicated, stably-ordered sequence of
/// `Failure` records. Empty or unparseable input yields the empty sequence
/// without error.
pub fn parse(raw: &str) -> Vec<Failure> {
    let mut seen = HashSet::new();
    let mut failures = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(failure) = parse_anchored_line(line).or_else(|| parse_failed_line(line)) {
            let key = (
                failure.file_path.clone(),
                failure.test_name.clone(),
                failure.error_message.clone(),
            );
            if seen.insert(key) {
                failures.push(failure);
            }
        }
    }

    failures
}

fn parse_anchored_line(line: &str) -> Option<Failure> {
    let caps = anchored_re().captures(line)?;
    let file_path = PathBuf::from(&caps["file"]);
    let test_name = caps["test"].to_string();
    let message = caps["message"].trim().to_string();
    Some(Failure {
        error_kind: classify(&message),
        file_path,
        test_name,
        error_message: message,
        raw_location: Some(line.to_string()),
    })
}

fn parse_failed_line(line: &str) -> Option<Failure> {
    let caps = failed_line_re().captures(line)?;
    let rest = &caps["rest"];
    let mut parts = rest.splitn(2, " - ");
    let location = parts.next()?.trim();
    let message = parts.next().unwrap_or("").trim();
    if message.is_empty() {
        return None;
    }

    let (file_path, test_name) = match location.split_once("::") {
        Some((f, t)) => (PathBuf::from(f), t.to_string()),
        None => (PathBuf::from(location), location.to_string()),
    };

    Some(Failure {
        error_kind: classify(message),
        file_path,
        test_name,
        error_message: message.to_string(),
        raw_location: Some(line.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::ErrorKind;

    #[test]
    fn empty_input_yields_no_failures() {
        assert_eq!(parse(""), Vec::new());
        assert_eq!(parse("   \n  \n"), Vec::new());
    }

    #[test]
    fn parses_anchored_format() {
        let raw = "tests/test_x.py::test_y - AssertionError: 1 != 2";
        let failures = parse(raw);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].test_name, "test_y");
        assert_eq!(failures[0].file_path, PathBuf::from("tests/test_x.py"));
        assert!(matches!(
            failures[0].error_kind,
            ErrorKind::AssertionMismatch { .. }
        ));
    }

    #[test]
    fn parses_failed_line_fallback() {
        let raw = "FAILED tests/test_x.py::test_y - No module named 'math'";
        let failures = parse(raw);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].test_name, "test_y");
        assert!(matches!(
            failures[0].error_kind,
            ErrorKind::ImportError { .. }
        ));
    }

    #[test]
    fn dedups_identical_failures_preserving_order() {
        let raw = "\
tests/a.py::t1 - AssertionError: 1 != 2
tests/b.py::t2 - No module named 'math'
tests/a.py::t1 - AssertionError: 1 != 2
";
        let failures = parse(raw);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].test_name, "t1");
        assert_eq!(failures[1].test_name, "t2");
    }

    #[test]
    fn parsing_is_deterministic() {
        let raw = "tests/a.py::t1 - AssertionError: 1 != 2\ntests/b.py::t2 - KeyError: 'x'\n";
        assert_eq!(parse(raw), parse(raw));
    }

    #[test]
    fn ignores_unrecognized_lines() {
        let raw = "collecting tests...\nsome unrelated log line\n";
        assert_eq!(parse(raw), Vec::new());
    }

    proptest::proptest! {
        #[test]
        fn parse_never_panics(s in ".*") {
            let _ = parse(&s);
        }
    }
}
