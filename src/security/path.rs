//! Target directory validation.
//!
//! Existence and accessibility are always enforced. What the path may look
//! like is governed by [`SecurityLevel`].

use std::fmt;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::log_component;

/// Longest absolute path accepted at [`SecurityLevel::Strict`], in bytes.
pub const MAX_STRICT_PATH_LEN: usize = 4096;

/// How aggressively a requested path is checked before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Normalization only; the caller vouches for the input
    Permissive,
    /// Normalization plus NUL byte rejection
    #[default]
    Normal,
    /// Normalization, no control characters, bounded length
    Strict,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityLevel::Permissive => "permissive",
            SecurityLevel::Normal => "normal",
            SecurityLevel::Strict => "strict",
        };
        f.write_str(name)
    }
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(SecurityLevel::Permissive),
            "normal" => Ok(SecurityLevel::Normal),
            "strict" => Ok(SecurityLevel::Strict),
            other => Err(format!(
                "unknown security level '{}' (expected permissive, normal or strict)",
                other
            )),
        }
    }
}

/// Validate `raw` as a handoff target and return its absolute, normalized form.
///
/// Relative paths are resolved against `base`, or the process working
/// directory when `base` is `None`. The shape policy runs before the
/// filesystem is touched, so a rejected path is never stat'ed.
pub fn validate_target_path(
    raw: &str,
    level: SecurityLevel,
    base: Option<&Path>,
) -> Result<PathBuf, PathError> {
    let absolute = absolutize(Path::new(raw), base)?;
    let normalized = normalize_lexically(&absolute);

    check_shape(raw, &normalized, level)?;

    let metadata = fs::metadata(&normalized).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PathError::NotFound,
        _ => PathError::NotAccessible(e),
    })?;
    if !metadata.is_dir() {
        return Err(PathError::NotDirectory);
    }

    // The directory may vanish or lose permissions after the stat above.
    fs::read_dir(&normalized).map_err(PathError::NotAccessible)?;

    log_component!(
        debug,
        "validator",
        "target validated",
        path = %normalized.display(),
        level = %level
    );
    Ok(normalized)
}

fn absolutize(path: &Path, base: Option<&Path>) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let base = match base {
        Some(base) => base.to_path_buf(),
        None => std::env::current_dir().map_err(PathError::Unresolvable)?,
    };
    Ok(base.join(path))
}

/// Collapse `.` and `..` without consulting the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if !out.pop() && !path.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn check_shape(raw: &str, normalized: &Path, level: SecurityLevel) -> Result<(), PathError> {
    match level {
        SecurityLevel::Permissive => Ok(()),
        SecurityLevel::Normal => {
            // Shell metacharacters are left to the script generator's quoting.
            if raw.contains('\0') {
                return Err(PathError::SecurityViolation(
                    "path contains a NUL byte".to_string(),
                ));
            }
            Ok(())
        }
        SecurityLevel::Strict => {
            // The raw input can hide a byte behind `..`; the normalized path can
            // pick one up from the base directory. Both must be clean.
            let resolved = normalized.as_os_str().as_bytes().iter().copied();
            if let Some(b) = raw.bytes().chain(resolved).find(|b| is_control_byte(*b)) {
                return Err(PathError::SecurityViolation(format!(
                    "path contains control character 0x{:02x}",
                    b
                )));
            }
            let len = normalized.as_os_str().len();
            if len > MAX_STRICT_PATH_LEN {
                return Err(PathError::SecurityViolation(format!(
                    "path is {} bytes, limit is {}",
                    len, MAX_STRICT_PATH_LEN
                )));
            }
            Ok(())
        }
    }
}

fn is_control_byte(b: u8) -> bool {
    b < 0x20 || b == 0x7f
}

/// Returns `true` if `path` exists and is a directory.
pub fn directory_exists(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Returns `true` if `path` is a directory that can be listed.
pub fn is_directory_accessible(path: &Path) -> bool {
    directory_exists(path) && fs::read_dir(path).is_ok()
}
