//! Standalone import-fix pass: walks the project tree, looks for a fixed set
//! of commonly-missing module references, and patches them in place without
//! running the test suite. Backs the `fix-imports` CLI command.

use shde_core::{ErrorKind, Failure};
use shde_patterns::{ImportErrorHandler, PatternHandler};
use std::path::{Path, PathBuf};

/// Standard-library-ish module names this pass knows to look for. A module
/// is flagged as missing when the source uses `module.attr` but never
/// imports it.
const KNOWN_MODULES: &[&str] = &[
    "os", "sys", "re", "json", "math", "time", "random", "itertools", "functools",
    "collections", "datetime", "subprocess", "shutil", "logging",
];

/// One file's worth of import-fix outcomes: modules the scan added an
/// `import` statement for.
pub struct ScanOutcome {
    /// File that was patched.
    pub path: PathBuf,
    /// Modules successfully imported.
    pub fixed: Vec<String>,
}

/// Walk every `.py` file under `root`, applying [`ImportErrorHandler`] for
/// each module it finds used but never imported, writing the result back to
/// disk when a module was added.
pub fn scan_and_fix(root: &Path) -> std::io::Result<Vec<ScanOutcome>> {
    let mut outcomes = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "py"))
    {
        let path = entry.path().to_path_buf();
        let source = std::fs::read_to_string(&path)?;
        let mut patched = source.clone();
        let mut fixed = Vec::new();
        for module in KNOWN_MODULES {
            if !source.contains(&format!("{module}.")) {
                continue;
            }
            let failure = import_failure(&path, module);
            if let Some(rewritten) = ImportErrorHandler.apply(&patched, &failure) {
                patched = rewritten;
                fixed.push(module.to_string());
            }
        }
        if !fixed.is_empty() {
            std::fs::write(&path, patched)?;
            outcomes.push(ScanOutcome { path, fixed });
        }
    }
    Ok(outcomes)
}

fn import_failure(path: &Path, module: &str) -> Failure {
    Failure {
        file_path: path.to_path_buf(),
        test_name: String::new(),
        error_kind: ErrorKind::ImportError {
            module: module.to_string(),
        },
        error_message: format!("No module named '{module}'"),
        raw_location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_missing_import_and_leaves_existing_ones_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "x = math.sqrt(4)\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "import os\nos.getcwd()\n").unwrap();

        let outcomes = scan_and_fix(dir.path()).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path, dir.path().join("a.py"));
        assert_eq!(outcomes[0].fixed, vec!["math".to_string()]);
        let patched = std::fs::read_to_string(dir.path().join("a.py")).unwrap();
        assert_eq!(patched, "import math\nx = math.sqrt(4)\n");
    }

    #[test]
    fn non_python_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "math.sqrt(4)\n").unwrap();
        assert!(scan_and_fix(dir.path()).unwrap().is_empty());
    }
}
