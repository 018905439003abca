//! Classifies a raw error message into the closed `ErrorKind` catalogue the
//! Pattern Fixer (C5) matches against.

use regex::Regex;
use shde_core::ErrorKind;
use std::sync::OnceLock;

fn missing_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([\w.]+)' object has no attribute '(\w+)'").unwrap())
}

fn assertion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"AssertionError:\s*(.+?)\s*!=\s*(.+)").unwrap())
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"No module named '([\w.]+)'").unwrap())
}

fn missing_args_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\w+)\(\)\s+missing\s+(\d+)\s+required positional argument").unwrap()
    })
}

/// Classify a raw error message into the fixed `ErrorKind` catalogue.
/// Anything unrecognized falls into `ErrorKind::Other`.
pub fn classify(message: &str) -> ErrorKind {
    if message.contains("IndentationError") {
        return ErrorKind::IndentationError;
    }
    if let Some(caps) = missing_attr_re().captures(message) {
        return ErrorKind::MissingAttribute {
            class_name: caps[1].to_string(),
            attribute: caps[2].to_string(),
        };
    }
    if let Some(caps) = assertion_re().captures(message) {
        return ErrorKind::AssertionMismatch {
            expected: caps[1].trim().to_string(),
            actual: caps[2].trim().to_string(),
        };
    }
    if let Some(caps) = import_re().captures(message) {
        return ErrorKind::ImportError {
            module: caps[1].to_string(),
        };
    }
    if let Some(caps) = missing_args_re().captures(message) {
        return ErrorKind::TypeErrorMissingArgs {
            callee: caps[1].to_string(),
            count: caps[2].parse().unwrap_or(1),
        };
    }
    ErrorKind::Other(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_missing_attribute() {
        let kind = classify("'X' object has no attribute 'y'");
        assert_eq!(
            kind,
            ErrorKind::MissingAttribute {
                class_name: "X".into(),
                attribute: "y".into(),
            }
        );
    }

    #[test]
    fn classifies_assertion_mismatch() {
        let kind = classify("AssertionError: 1 != 2");
        assert_eq!(
            kind,
            ErrorKind::AssertionMismatch {
                expected: "1".into(),
                actual: "2".into(),
            }
        );
    }

    #[test]
    fn classifies_import_error() {
        let kind = classify("No module named 'math'");
        assert_eq!(
            kind,
            ErrorKind::ImportError {
                module: "math".into()
            }
        );
    }

    #[test]
    fn classifies_missing_args() {
        let kind = classify("f() missing 2 required positional arguments: 'a' and 'b'");
        assert_eq!(
            kind,
            ErrorKind::TypeErrorMissingArgs {
                callee: "f".into(),
                count: 2,
            }
        );
    }

    #[test]
    fn classifies_indentation_error() {
        assert_eq!(
            classify("IndentationError: unexpected indent"),
            ErrorKind::IndentationError
        );
    }

    #[test]
    fn falls_back_to_other() {
        let kind = classify("KeyError: 'missing_key'");
        assert_eq!(kind, ErrorKind::Other("KeyError: 'missing_key'".into()));
    }
}
