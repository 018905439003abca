//! Shared atomic-write and corrupt-file-quarantine helpers used by every
//! ledger in this crate.

use crate::error::TrackerError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// Load a JSON document from `path`, falling back to `T::default()` and
/// quarantining the file (renamed with a timestamp suffix) if it is
/// unreadable or malformed. Never errors — persistence corruption is
/// always recovered locally rather than surfaced to the caller.
pub fn load_or_quarantine<T>(path: &Path, now_secs: i64) -> T
where
    T: Default + DeserializeOwned,
{
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "cannot read ledger");
            }
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ledger is corrupt, quarantining");
            quarantine(path, now_secs);
            T::default()
        }
    }
}

fn quarantine(path: &Path, now_secs: i64) {
    let quarantined = path.with_extension(format!("json.corrupt-{now_secs}"));
    if let Err(e) = std::fs::rename(path, &quarantined) {
        tracing::warn!(path = %path.display(), error = %e, "failed to quarantine corrupt ledger");
    }
}

/// Write `value` to `path` atomically: write to a sibling `.tmp` file, then
/// rename into place. Never leaves `path` half-written.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), TrackerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TrackerError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(TrackerError::Serialize)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes()).map_err(|source| TrackerError::WriteTemp {
        path: tmp.display().to_string(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        TrackerError::Finalize {
            path: path.display().to_string(),
            source,
        }
    })
}
