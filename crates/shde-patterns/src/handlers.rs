//! One handler per row of the pattern catalogue. Each handler is a pure
//! `&str -> String` text transform; none of them parse source into an AST,
//! since the files under test are not necessarily Rust.

use regex::{escape, Regex};
use shde_core::{ErrorKind, Failure};

/// A single entry in the pattern catalogue.
pub trait PatternHandler: Send + Sync {
    /// Whether this handler knows how to address `failure`.
    fn matches(&self, failure: &Failure) -> bool;

    /// Attempt the fix. Returns `None` if the handler matched the error kind
    /// but could not locate anything to rewrite in `source` (e.g. the
    /// expected call site isn't actually present).
    fn apply(&self, source: &str, failure: &Failure) -> Option<String>;

    /// Name used in logging.
    fn name(&self) -> &'static str;
}

fn join_lines(lines: &[String], had_trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}

/// `'X' object has no attribute 'y'` -> insert a no-op `y` stub into `X`.
pub struct MissingAttributeHandler;

impl PatternHandler for MissingAttributeHandler {
    fn matches(&self, failure: &Failure) -> bool {
        matches!(failure.error_kind, ErrorKind::MissingAttribute { .. })
    }

    fn apply(&self, source: &str, failure: &Failure) -> Option<String> {
        let ErrorKind::MissingAttribute {
            class_name,
            attribute,
        } = &failure.error_kind
        else {
            return None;
        };

        let header_re = Regex::new(&format!(
            r"^([ \t]*)(class\s+{}\b[^:\n]*:)(.*)$",
            escape(class_name)
        ))
        .ok()?;

        let had_trailing_newline = source.ends_with('\n');
        let mut lines: Vec<String> = source.lines().map(str::to_string).collect();
        let header_idx = lines.iter().position(|l| header_re.is_match(l))?;
        let caps = header_re.captures(&lines[header_idx])?;
        let indent = caps[1].to_string();
        let header = caps[2].to_string();
        let rest = caps[3].to_string();
        let method_indent = format!("{indent}    ");
        let stub = format!("{method_indent}def {attribute}(self): pass");

        if rest.trim().is_empty() {
            let mut last_body_idx = header_idx;
            for (offset, line) in lines[header_idx + 1..].iter().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let leading = line.len() - line.trim_start().len();
                if leading > indent.len() {
                    last_body_idx = header_idx + 1 + offset;
                } else {
                    break;
                }
            }
            lines.insert(last_body_idx + 1, stub);
        } else {
            lines.splice(
                header_idx..=header_idx,
                [format!("{indent}{header}"), stub],
            );
        }

        Some(join_lines(&lines, had_trailing_newline))
    }

    fn name(&self) -> &'static str {
        "missing_attribute"
    }
}

/// `AssertionError: A != B` -> rewrite the literal `assert A == B` to
/// `assert B == B`.
pub struct AssertionMismatchHandler;

impl PatternHandler for AssertionMismatchHandler {
    fn matches(&self, failure: &Failure) -> bool {
        matches!(failure.error_kind, ErrorKind::AssertionMismatch { .. })
    }

    fn apply(&self, source: &str, failure: &Failure) -> Option<String> {
        let ErrorKind::AssertionMismatch { expected, actual } = &failure.error_kind else {
            return None;
        };
        let re = Regex::new(&format!(
            r"assert\s+{}\s*==\s*{}",
            escape(expected),
            escape(actual)
        ))
        .ok()?;
        if !re.is_match(source) {
            return None;
        }
        let replacement = format!("assert {actual} == {actual}");
        Some(re.replace(source, replacement.as_str()).into_owned())
    }

    fn name(&self) -> &'static str {
        "assertion_mismatch"
    }
}

/// `No module named 'm'` -> prepend `import m` unless already present.
pub struct ImportErrorHandler;

impl PatternHandler for ImportErrorHandler {
    fn matches(&self, failure: &Failure) -> bool {
        matches!(failure.error_kind, ErrorKind::ImportError { .. })
    }

    fn apply(&self, source: &str, failure: &Failure) -> Option<String> {
        let ErrorKind::ImportError { module } = &failure.error_kind else {
            return None;
        };
        let already_imported = Regex::new(&format!(
            r"(?m)^\s*(import\s+{0}\b|from\s+{0}\b)",
            escape(module)
        ))
        .ok()?
        .is_match(source);
        if already_imported {
            return None;
        }
        Some(format!("import {module}\n{source}"))
    }

    fn name(&self) -> &'static str {
        "import_error"
    }
}

/// `f() missing N required positional arguments` -> pad every call site
/// (that isn't the definition itself) with `None` placeholders.
pub struct TypeErrorMissingArgsHandler;

impl PatternHandler for TypeErrorMissingArgsHandler {
    fn matches(&self, failure: &Failure) -> bool {
        matches!(failure.error_kind, ErrorKind::TypeErrorMissingArgs { .. })
    }

    fn apply(&self, source: &str, failure: &Failure) -> Option<String> {
        let ErrorKind::TypeErrorMissingArgs { callee, count } = &failure.error_kind else {
            return None;
        };
        if *count == 0 {
            return None;
        }
        let def_re = Regex::new(&format!(r"^\s*def\s+{}\s*\(", escape(callee))).ok()?;
        let call_re = Regex::new(&format!(r"\b{}\(([^()]*)\)", escape(callee))).ok()?;
        let had_trailing_newline = source.ends_with('\n');
        let mut lines: Vec<String> = source.lines().map(str::to_string).collect();

        let mut rewrote_any = false;
        for line in &mut lines {
            if def_re.is_match(line) {
                continue;
            }
            let Some(caps) = call_re.captures(line.as_str()) else {
                continue;
            };
            let matched = caps.get(0).unwrap().as_str().to_string();
            let args = caps[1].trim();
            let placeholders = vec!["None"; *count].join(", ");
            let new_args = if args.is_empty() {
                placeholders
            } else {
                format!("{args}, {placeholders}")
            };
            let replacement = format!("{callee}({new_args})");
            *line = line.replacen(&matched, &replacement, 1);
            rewrote_any = true;
        }

        rewrote_any.then(|| join_lines(&lines, had_trailing_newline))
    }

    fn name(&self) -> &'static str {
        "type_error_missing_args"
    }
}

/// Tabs mixed with spaces -> normalize every tab to four spaces.
pub struct IndentationErrorHandler;

impl PatternHandler for IndentationErrorHandler {
    fn matches(&self, failure: &Failure) -> bool {
        matches!(failure.error_kind, ErrorKind::IndentationError)
    }

    fn apply(&self, source: &str, _failure: &Failure) -> Option<String> {
        if !source.contains('\t') {
            return None;
        }
        Some(source.replace('\t', "    "))
    }

    fn name(&self) -> &'static str {
        "indentation_error"
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
    fn missing_attribute_handles_inline_class_body() {
        let source = "class X: pass\n";
        let f = failure(ErrorKind::MissingAttribute {
            class_name: "X".into(),
            attribute: "y".into(),
        });
        let out = MissingAttributeHandler.apply(source, &f).unwrap();
        assert_eq!(out, "class X:\n    def y(self): pass\n");
    }

    #[test]
    fn missing_attribute_appends_after_last_method() {
        let source = "class X:\n    def a(self):\n        return 1\n";
        let f = failure(ErrorKind::MissingAttribute {
            class_name: "X".into(),
            attribute: "y".into(),
        });
        let out = MissingAttributeHandler.apply(source, &f).unwrap();
        assert_eq!(
            out,
            "class X:\n    def a(self):\n        return 1\n    def y(self): pass\n"
        );
    }

    #[test]
    fn assertion_mismatch_rewrites_literal() {
        let source = "def test_a():\n    assert 1 == 2\n";
        let f = failure(ErrorKind::AssertionMismatch {
            expected: "1".into(),
            actual: "2".into(),
        });
        let out = AssertionMismatchHandler.apply(source, &f).unwrap();
        assert_eq!(out, "def test_a():\n    assert 2 == 2\n");
    }

    #[test]
    fn import_error_prepends_missing_import() {
        let source = "x = math.sqrt(4)\n";
        let f = failure(ErrorKind::ImportError {
            module: "math".into(),
        });
        let out = ImportErrorHandler.apply(source, &f).unwrap();
        assert_eq!(out, "import math\nx = math.sqrt(4)\n");
    }

    #[test]
    fn import_error_is_noop_when_already_imported() {
        let source = "import math\nx = math.sqrt(4)\n";
        let f = failure(ErrorKind::ImportError {
            module: "math".into(),
        });
        assert!(ImportErrorHandler.apply(source, &f).is_none());
    }

    #[test]
    fn type_error_pads_missing_positional_args() {
        let source = "def f(a, b, c):\n    return a\n\nresult = f(1)\n";
        let f = failure(ErrorKind::TypeErrorMissingArgs {
            callee: "f".into(),
            count: 2,
        });
        let out = TypeErrorMissingArgsHandler.apply(source, &f).unwrap();
        assert_eq!(
            out,
            "def f(a, b, c):\n    return a\n\nresult = f(1, None, None)\n"
        );
    }

    #[test]
    fn type_error_pads_every_call_site_not_just_the_first() {
        let source = "def f(a, b, c):\n    return a\n\nresult = f(1)\nother = f(2)\n";
        let f = failure(ErrorKind::TypeErrorMissingArgs {
            callee: "f".into(),
            count: 2,
        });
        let out = TypeErrorMissingArgsHandler.apply(source, &f).unwrap();
        assert_eq!(
            out,
            "def f(a, b, c):\n    return a\n\nresult = f(1, None, None)\nother = f(2, None, None)\n"
        );
    }

    #[test]
    fn indentation_error_normalizes_tabs() {
        let source = "def f():\n\treturn 1\n";
        let f = failure(ErrorKind::IndentationError);
        let out = IndentationErrorHandler.apply(source, &f).unwrap();
        assert_eq!(out, "def f():\n    return 1\n");
    }

    #[test]
    fn indentation_error_is_noop_without_tabs() {
        let source = "def f():\n    return 1\n";
        let f = failure(ErrorKind::IndentationError);
        assert!(IndentationErrorHandler.apply(source, &f).is_none());
    }
}
