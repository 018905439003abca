//! Backup Vault (C4): lazy, per-file, per-session byte-exact snapshots.
//!
//! `ensure_backup` is idempotent within a session; `restore` copies the
//! stored bytes back verbatim and releases the slot. A session commit
//! deletes the held snapshots; a session abort restores every held
//! snapshot in reverse order of acquisition.
//!
//! The Backup Vault exclusively owns its snapshot files — the Rollback
//! Manager consults it but never writes to its storage directly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::BackupError;

use sha2::{Digest, Sha256};
use shde_core::SessionId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn snapshot_file_name(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}.bak", hasher.finalize())
}

/// A held snapshot: the original bytes are on disk under the vault's
/// directory; this struct is the in-memory handle.
struct Snapshot {
    file_path: PathBuf,
    snapshot_path: PathBuf,
}

/// Byte-exact, per-session file snapshot store.
pub struct BackupVault {
    root: PathBuf,
    /// Per-session snapshots, keyed by file path, plus acquisition order
    /// for reverse-order abort restores.
    sessions: HashMap<SessionId, SessionState>,
}

#[derive(Default)]
struct SessionState {
    by_path: HashMap<PathBuf, Snapshot>,
    order: Vec<PathBuf>,
}

impl BackupVault {
    /// Root directory under which `rollback_backups/<session>/` lives.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join("rollback_backups"),
            sessions: HashMap::new(),
        }
    }

    fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.root.join(&session.0)
    }

    /// Snapshot `path` for `session` unless one is already held (idempotent
    /// within a session).
    pub fn ensure_backup(&mut self, session: &SessionId, path: &Path) -> Result<(), BackupError> {
        let dir = self.session_dir(session);
        let state = self.sessions.entry(session.clone()).or_default();
        if state.by_path.contains_key(path) {
            return Ok(());
        }

        let original = std::fs::read(path).map_err(|source| BackupError::ReadOriginal {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::create_dir_all(&dir).map_err(|source| BackupError::WriteSnapshot {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot_path = dir.join(snapshot_file_name(path));
        std::fs::write(&snapshot_path, &original).map_err(|source| BackupError::WriteSnapshot {
            path: path.display().to_string(),
            source,
        })?;

        let manifest_path = dir.join("manifest.json");
        append_manifest_entry(&manifest_path, path, &snapshot_path)
            .map_err(BackupError::WriteManifest)?;

        state.order.push(path.to_path_buf());
        state.by_path.insert(
            path.to_path_buf(),
            Snapshot {
                file_path: path.to_path_buf(),
                snapshot_path,
            },
        );
        tracing::debug!(path = %path.display(), session = %session, "backup created");
        Ok(())
    }

    /// Whether a snapshot is currently held for `path` in `session`.
    pub fn has_backup(&self, session: &SessionId, path: &Path) -> bool {
        self.sessions
            .get(session)
            .is_some_and(|s| s.by_path.contains_key(path))
    }

    /// Restore `path` to its snapshotted bytes and release the slot.
    pub fn restore(&mut self, session: &SessionId, path: &Path) -> Result<(), BackupError> {
        let state = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| BackupError::NoSnapshot(path.display().to_string()))?;
        let snapshot = state
            .by_path
            .remove(path)
            .ok_or_else(|| BackupError::NoSnapshot(path.display().to_string()))?;
        state.order.retain(|p| p != path);

        let bytes = std::fs::read(&snapshot.snapshot_path).map_err(|source| {
            BackupError::ReadOriginal {
                path: snapshot.snapshot_path.display().to_string(),
                source,
            }
        })?;
        std::fs::write(&snapshot.file_path, bytes).map_err(|source| BackupError::WriteRestored {
            path: snapshot.file_path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %snapshot.file_path.display(), session = %session, "backup restored");
        Ok(())
    }

    /// Commit the session: release every held snapshot without restoring
    /// (the mutations are being kept).
    pub fn commit_session(&mut self, session: &SessionId) -> Result<(), BackupError> {
        self.sessions.remove(session);
        let dir = self.session_dir(session);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|source| BackupError::RemoveSessionDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Abort the session: restore every held snapshot, most-recently
    /// acquired first.
    pub fn abort_session(&mut self, session: &SessionId) -> Result<(), BackupError> {
        let order = self
            .sessions
            .get(session)
            .map(|s| s.order.clone())
            .unwrap_or_default();
        for path in order.into_iter().rev() {
            self.restore(session, &path)?;
        }
        self.commit_session(session)
    }
}

fn append_manifest_entry(
    manifest_path: &Path,
    original: &Path,
    snapshot: &Path,
) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(manifest_path)?;
    writeln!(file, "{}\t{}", original.display(), snapshot.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn ensure_backup_is_idempotent() {
        let data_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let session = SessionId("s1".into());
        let file = write_file(project_dir.path(), "a.py", "original");

        vault.ensure_backup(&session, &file).unwrap();
        std::fs::write(&file, "mutated").unwrap();
        vault.ensure_backup(&session, &file).unwrap(); // no-op: still holds "original"

        vault.restore(&session, &file).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
    }

    #[test]
    fn restore_is_byte_exact() {
        let data_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let session = SessionId("s1".into());
        let file = write_file(project_dir.path(), "a.py", "line one\nline two\n");

        vault.ensure_backup(&session, &file).unwrap();
        std::fs::write(&file, "completely different content").unwrap();
        vault.restore(&session, &file).unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "line one\nline two\n"
        );
    }

    #[test]
    fn abort_restores_in_reverse_order() {
        let data_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let session = SessionId("s1".into());
        let a = write_file(project_dir.path(), "a.py", "a-original");
        let b = write_file(project_dir.path(), "b.py", "b-original");

        vault.ensure_backup(&session, &a).unwrap();
        vault.ensure_backup(&session, &b).unwrap();
        std::fs::write(&a, "a-mutated").unwrap();
        std::fs::write(&b, "b-mutated").unwrap();

        vault.abort_session(&session).unwrap();
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "a-original");
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "b-original");
    }

    #[test]
    fn commit_releases_without_restoring() {
        let data_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let session = SessionId("s1".into());
        let file = write_file(project_dir.path(), "a.py", "original");

        vault.ensure_backup(&session, &file).unwrap();
        std::fs::write(&file, "kept mutation").unwrap();
        vault.commit_session(&session).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "kept mutation");
        assert!(!vault.has_backup(&session, &file));
    }

    #[test]
    fn restore_without_backup_is_an_error() {
        let data_dir = tempfile::tempdir().unwrap();
        let mut vault = BackupVault::new(data_dir.path());
        let session = SessionId("s1".into());
        let err = vault.restore(&session, Path::new("never_backed_up.py"));
        assert!(err.is_err());
    }
}
