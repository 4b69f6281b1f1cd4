//! Script persistence and stale script reconciliation.
//!
//! Scripts live in a shared temp directory under unique `exitcd_*.sh` names,
//! so concurrent invocations never contend for a file. Nothing locks.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::log_component;
use crate::script::TransitionScript;
use crate::security::directory_exists;

/// File name prefix shared by every stored script.
pub const SCRIPT_PREFIX: &str = "exitcd_";
pub const SCRIPT_SUFFIX: &str = ".sh";

/// Owner read/write/execute, nothing for group or other.
pub const SCRIPT_MODE: u32 = 0o700;

/// A transition script on disk, waiting to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryScriptFile {
    path: PathBuf,
    created_at: DateTime<Utc>,
    owner_pid: u32,
}

impl TemporaryScriptFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }

    /// Delete the file. A file that is already gone counts as removed.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Writes transition scripts into one directory.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    dir: PathBuf,
}

impl Default for ScriptStore {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }
}

impl ScriptStore {
    /// Store into `custom`, or the system temp directory when `None`.
    ///
    /// A relative `custom` is anchored to `base`, or the process working
    /// directory when `base` is `None`. The script deletes itself via `$0`
    /// after it has already changed directory, so the path must be absolute.
    pub fn new(custom: Option<&Path>, base: Option<&Path>) -> Self {
        let Some(dir) = custom else {
            return Self::default();
        };
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            match base {
                Some(base) => base.join(dir),
                None => std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf()),
            }
        };
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `script` to a fresh, owner-only executable file.
    ///
    /// The file is created `0600` and tightened to `0700` through the open
    /// handle, so it is never readable by anyone else. On any error the
    /// partially written file is removed.
    pub fn persist(&self, script: &TransitionScript) -> Result<TemporaryScriptFile, StoreError> {
        let mut file = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|source| StoreError::Create {
                dir: self.dir.clone(),
                source,
            })?;

        file.write_all(script.text().as_bytes())
            .and_then(|_| file.flush())
            .map_err(StoreError::Write)?;

        file.as_file()
            .set_permissions(fs::Permissions::from_mode(SCRIPT_MODE))
            .map_err(StoreError::Permissions)?;

        let (_file, path) = file.keep().map_err(|e| StoreError::Persist(e.error))?;

        let stored = TemporaryScriptFile {
            path,
            created_at: Utc::now(),
            owner_pid: std::process::id(),
        };
        log_component!(
            debug,
            "store",
            "script stored",
            path = %stored.path.display(),
            created_at = %stored.created_at.to_rfc3339(),
            pid = stored.owner_pid
        );
        Ok(stored)
    }
}

/// `custom` when it names an existing directory, the system temp directory otherwise.
pub fn resolve_temp_dir(custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(dir) if directory_exists(dir) => dir.to_path_buf(),
        _ => std::env::temp_dir(),
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files carrying the script prefix
    pub scanned: usize,
    pub removed: usize,
    /// Stale files that could not be deleted
    pub failed: usize,
}

impl ReconcileReport {
    pub fn merge(self, other: ReconcileReport) -> Self {
        Self {
            scanned: self.scanned + other.scanned,
            removed: self.removed + other.removed,
            failed: self.failed + other.failed,
        }
    }
}

/// Delete scripts in `dir` whose last modification is older than `max_age`.
///
/// Only an unreadable `dir` is an error. Per-file failures are counted and
/// skipped, and a file that vanishes mid-pass (it ran its own cleanup) is
/// simply ignored.
pub fn reap_stale_scripts(dir: &Path, max_age: Duration) -> io::Result<ReconcileReport> {
    let now = SystemTime::now();
    let mut report = ReconcileReport::default();

    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };

        if !entry.file_name().to_string_lossy().starts_with(SCRIPT_PREFIX) {
            continue;
        }
        match entry.file_type() {
            Ok(ft) if ft.is_file() => {}
            _ => continue,
        }
        report.scanned += 1;

        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let is_stale = now
            .duration_since(modified)
            .map(|age| age > max_age)
            .unwrap_or(false);
        if !is_stale {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to remove stale script {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    log_component!(
        debug,
        "store",
        "reconciliation pass finished",
        dir = %dir.display(),
        scanned = report.scanned,
        removed = report.removed,
        failed = report.failed
    );
    Ok(report)
}
