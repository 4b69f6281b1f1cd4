//! Shell resolution
//!
//! Decides which executable becomes the user's interactive shell once the
//! transition script finishes. Resolution never fails: an unusable result is
//! reported through [`ShellDescriptor::is_valid`] and the orchestrator decides.

use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::config::Environment;
use crate::log_component;

/// Shell that exists on every POSIX system.
pub const POSIX_FALLBACK_SHELL: &str = "/bin/sh";

/// Rough shell family, derived from the executable's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
    Fish,
    Dash,
    Sh,
    Unknown,
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Fish => "fish",
            ShellKind::Dash => "dash",
            ShellKind::Sh => "sh",
            ShellKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A resolved shell executable and whether it can actually be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellDescriptor {
    path: PathBuf,
    is_valid: bool,
}

impl ShellDescriptor {
    /// Stat `path` and record whether it is a runnable shell.
    pub fn inspect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_valid = is_executable_file(&path);
        Self { path, is_valid }
    }

    pub fn invalid(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_valid: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn kind(&self) -> ShellKind {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains("bash") {
            ShellKind::Bash
        } else if name.contains("zsh") {
            ShellKind::Zsh
        } else if name.contains("fish") {
            ShellKind::Fish
        } else if name.contains("dash") {
            ShellKind::Dash
        } else if name.contains("sh") {
            ShellKind::Sh
        } else {
            ShellKind::Unknown
        }
    }
}

/// Regular file (after following symlinks) with at least one execute bit.
pub fn is_executable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[derive(Debug, Clone)]
pub struct ShellResolver {
    fallback: PathBuf,
}

impl Default for ShellResolver {
    fn default() -> Self {
        Self {
            fallback: PathBuf::from(POSIX_FALLBACK_SHELL),
        }
    }
}

impl ShellResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different last-resort shell instead of `/bin/sh`.
    pub fn with_fallback(fallback: impl Into<PathBuf>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    /// Resolve the shell to hand off to.
    ///
    /// An explicit override wins: absolute paths are taken as-is, names are
    /// looked up on the snapshot's `PATH`. Without one, `SHELL` is used when it
    /// points at an executable file, and the fallback otherwise.
    pub fn resolve(&self, shell_override: Option<&str>, env: &Environment) -> ShellDescriptor {
        let descriptor = match shell_override.filter(|s| !s.is_empty()) {
            Some(name) => self.resolve_override(name, env),
            None => self.resolve_ambient(env),
        };
        log_component!(
            debug,
            "resolver",
            "shell resolved",
            path = %descriptor.path().display(),
            kind = %descriptor.kind(),
            valid = descriptor.is_valid()
        );
        descriptor
    }

    fn resolve_override(&self, name: &str, env: &Environment) -> ShellDescriptor {
        if Path::new(name).is_absolute() {
            return ShellDescriptor::inspect(name);
        }

        let cwd = env
            .current_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("/"));
        match which::which_in(name, env.search_path.as_ref(), cwd) {
            Ok(path) => ShellDescriptor::inspect(path),
            Err(e) => {
                log_component!(debug, "resolver", "shell override not on PATH", name = name, error = %e);
                ShellDescriptor::invalid(name)
            }
        }
    }

    fn resolve_ambient(&self, env: &Environment) -> ShellDescriptor {
        if let Some(shell) = env.shell.as_deref() {
            let descriptor = ShellDescriptor::inspect(shell);
            if descriptor.is_valid() {
                return descriptor;
            }
            log_component!(
                debug,
                "resolver",
                "SHELL is not executable, using fallback",
                shell = shell,
                fallback = %self.fallback.display()
            );
        }
        ShellDescriptor::inspect(&self.fallback)
    }
}
