//! Pattern Fixer (C5): a fixed catalogue of regex-driven source-text
//! transforms, tried in order, one per known [`shde_core::ErrorKind`]
//! variant. No AST parsing — the code under test is not assumed to be Rust.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod handlers;

pub use handlers::{
    AssertionMismatchHandler, ImportErrorHandler, IndentationErrorHandler, MissingAttributeHandler,
    PatternHandler, TypeErrorMissingArgsHandler,
};

use shde_core::Failure;

/// Tries each handler in catalogue order and returns the first successful
/// rewrite.
pub struct PatternFixer {
    handlers: Vec<Box<dyn PatternHandler>>,
}

impl Default for PatternFixer {
    fn default() -> Self {
        Self {
            handlers: vec![
                Box::new(MissingAttributeHandler),
                Box::new(AssertionMismatchHandler),
                Box::new(ImportErrorHandler),
                Box::new(TypeErrorMissingArgsHandler),
                Box::new(IndentationErrorHandler),
            ],
        }
    }
}

impl PatternFixer {
    /// Build the fixer with the standard catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt a fix for `failure` against `source`, trying handlers in
    /// catalogue order. Returns the rewritten source on the first match that
    /// produces one.
    pub fn propose(&self, source: &str, failure: &Failure) -> Option<String> {
        for handler in &self.handlers {
            if !handler.matches(failure) {
                continue;
            }
            if let Some(rewritten) = handler.apply(source, failure) {
                tracing::debug!(handler = handler.name(), "pattern fix applied");
                return Some(rewritten);
            }
            tracing::debug!(
                handler = handler.name(),
                "matched error kind but found nothing to rewrite"
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::ErrorKind;
    use std::path::PathBuf;

    fn failure(kind: ErrorKind) -> Failure {
        Failure {
            file_path: PathBuf::from("a.py"),
            test_name: "test_a".into(),
            error_kind: kind,
            error_message: String::new(),
            raw_location: None,
        }
    }

    #[test]
    fn propose_picks_the_matching_handler() {
        let fixer = PatternFixer::new();
        let source = "import math\n";
        let f = failure(ErrorKind::ImportError {
            module: "sys".into(),
        });
        let out = fixer.propose(source, &f).unwrap();
        assert_eq!(out, "import sys\nimport math\n");
    }

    #[test]
    fn propose_returns_none_when_no_handler_can_fix_it() {
        let fixer = PatternFixer::new();
        let source = "import math\n";
        let f = failure(ErrorKind::Other("segfault".into()));
        assert!(fixer.propose(source, &f).is_none());
    }

    proptest::proptest! {
        #[test]
        fn propose_never_panics(s in ".*") {
            let fixer = PatternFixer::new();
            let f = failure(ErrorKind::Other("x".into()));
            let _ = fixer.propose(&s, &f);
        }
    }
}
