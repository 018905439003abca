//! Learned-Fix Store (C2): a persistent key/value map from an
//! `ErrorSignature` to a previously successful `Patch`.
//!
//! Persistence is a single JSON document (`learning_db.json`) loaded on
//! open and rewritten atomically (write-to-temp then rename) after each
//! mutation. A malformed file resets the store to empty and logs a
//! warning — it never fails the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::LearnError;

use serde::{Deserialize, Serialize};
use shde_core::{ErrorSignature, LearnedFix, Patch, Timestamp};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk shape of `learning_db.json`: `signature -> LearnedFix`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    entries: HashMap<String, LearnedFix>,
}

/// In-memory, write-through cache over `learning_db.json`.
pub struct LearnedFixStore {
    path: PathBuf,
    entries: HashMap<ErrorSignature, LearnedFix>,
}

impl LearnedFixStore {
    /// Open (or lazily create) the store at `path`. Malformed persistence
    /// resets to empty rather than erroring.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<StoreDocument>(&content) {
                Ok(doc) => doc
                    .entries
                    .into_iter()
                    .map(|(k, v)| (ErrorSignature(k), v))
                    .collect(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "learned-fix store is malformed, starting empty");
                    HashMap::new()
                }
            },
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "cannot read learned-fix store");
                }
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    /// Look up a known-good patch for `signature`. Idempotent: repeated
    /// calls without an intervening `upsert` return the same value.
    pub fn lookup(&self, signature: &ErrorSignature) -> Option<&LearnedFix> {
        self.entries.get(signature)
    }

    /// Insert or replace the learned fix for `signature`, then persist.
    pub fn upsert(
        &mut self,
        signature: ErrorSignature,
        patch: Patch,
        now: Timestamp,
    ) -> Result<(), LearnError> {
        self.entries
            .entry(signature.clone())
            .and_modify(|fix| {
                fix.patch = patch.clone();
                fix.last_used = now;
            })
            .or_insert(LearnedFix {
                signature,
                patch,
                success_count: 1,
                last_used: now,
            });
        self.flush()
    }

    /// Bump the success count and refresh `last_used` for an existing fix.
    /// No-op if the signature isn't present.
    pub fn reinforce(&mut self, signature: &ErrorSignature, now: Timestamp) -> Result<(), LearnError> {
        if let Some(fix) = self.entries.get_mut(signature) {
            fix.success_count += 1;
            fix.last_used = now;
            self.flush()?;
        }
        Ok(())
    }

    /// Number of learned fixes currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the whole store to a separate file, letting a known-good
    /// `learning_db.json` seed a fresh project.
    pub fn export(&self, path: &Path) -> Result<(), LearnError> {
        write_atomic(path, &self.document())
    }

    /// Merge fixes from another store's export file into this one. Existing
    /// entries win ties (imported entries never regress a locally-learned
    /// fix with a higher success count).
    pub fn import(&mut self, path: &Path) -> Result<usize, LearnError> {
        let content = std::fs::read_to_string(path).map_err(|source| LearnError::ReadImport {
            path: path.display().to_string(),
            source,
        })?;
        let doc: StoreDocument =
            serde_json::from_str(&content).map_err(LearnError::Serialize)?;
        let mut imported = 0;
        for (sig, fix) in doc.entries {
            let signature = ErrorSignature(sig);
            let better = self
                .entries
                .get(&signature)
                .map(|existing| fix.success_count > existing.success_count)
                .unwrap_or(true);
            if better {
                self.entries.insert(signature, fix);
                imported += 1;
            }
        }
        self.flush()?;
        Ok(imported)
    }

    fn document(&self) -> StoreDocument {
        StoreDocument {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.0.clone(), v.clone()))
                .collect(),
        }
    }

    fn flush(&self) -> Result<(), LearnError> {
        write_atomic(&self.path, &self.document())
    }
}

/// Write-to-temp-then-rename so a crash between write and rename loses the
/// newest mutation but never corrupts the previous file.
fn write_atomic(path: &Path, doc: &StoreDocument) -> Result<(), LearnError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LearnError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(doc).map_err(LearnError::Serialize)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes()).map_err(|source| LearnError::WriteTemp {
        path: tmp.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        LearnError::Finalize {
            path: path.display().to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shde_core::Provenance;
    use std::path::PathBuf;

    fn sample_patch(sig: &ErrorSignature) -> Patch {
        Patch {
            diff: "--- a\n+++ b\n".into(),
            targets: vec![PathBuf::from("a.py")],
            provenance: Provenance::Learned,
            signature: sig.clone(),
        }
    }

    #[test]
    fn lookup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LearnedFixStore::open(dir.path().join("learning_db.json"));
        let sig = ErrorSignature("sig-1".into());
        store.upsert(sig.clone(), sample_patch(&sig), Timestamp(1)).unwrap();

        let first = store.lookup(&sig).map(|fix| fix.success_count);
        let second = store.lookup(&sig).map(|fix| fix.success_count);
        assert_eq!(first, second);
    }

    #[test]
    fn upsert_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learning_db.json");
        let sig = ErrorSignature("sig-2".into());
        {
            let mut store = LearnedFixStore::open(&path);
            store.upsert(sig.clone(), sample_patch(&sig), Timestamp(5)).unwrap();
        }
        let reopened = LearnedFixStore::open(&path);
        assert!(reopened.lookup(&sig).is_some());
    }

    #[test]
    fn reinforce_bumps_success_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LearnedFixStore::open(dir.path().join("learning_db.json"));
        let sig = ErrorSignature("sig-3".into());
        store.upsert(sig.clone(), sample_patch(&sig), Timestamp(1)).unwrap();
        store.reinforce(&sig, Timestamp(2)).unwrap();
        assert_eq!(store.lookup(&sig).unwrap().success_count, 2);
    }

    #[test]
    fn malformed_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learning_db.json");
        std::fs::write(&path, "not json").unwrap();
        let store = LearnedFixStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn export_then_import_merges() {
        let dir = tempfile::tempdir().unwrap();
        let sig = ErrorSignature("sig-4".into());
        let mut source = LearnedFixStore::open(dir.path().join("source.json"));
        source.upsert(sig.clone(), sample_patch(&sig), Timestamp(1)).unwrap();
        let export_path = dir.path().join("export.json");
        source.export(&export_path).unwrap();

        let mut target = LearnedFixStore::open(dir.path().join("target.json"));
        let imported = target.import(&export_path).unwrap();
        assert_eq!(imported, 1);
        assert!(target.lookup(&sig).is_some());
    }
}
