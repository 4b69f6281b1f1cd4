//! Process image replacement
//!
//! The stored script is run by a fixed POSIX interpreter rather than the
//! user's shell, so shells with non-POSIX syntax (fish, nushell, ...) only
//! ever appear as the script's final `exec` target.

use std::convert::Infallible;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ExecError;
use crate::log_component;
use crate::script::SCRIPT_INTERPRETER;
use crate::shell::ShellDescriptor;

/// Replaces the calling process with a stored transition script.
///
/// `Ok` is uninhabited: a call that returns at all has failed, and the
/// calling process is still alive.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessReplacer {
    fn replace(&self, script: &Path, shell: &ShellDescriptor) -> Result<Infallible, ExecError>;
}

/// Runs `<interpreter> <script>` in place of the current process.
#[derive(Debug, Clone)]
pub struct PosixReplacer {
    interpreter: PathBuf,
}

impl Default for PosixReplacer {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(SCRIPT_INTERPRETER),
        }
    }
}

impl PosixReplacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }
}

impl ProcessReplacer for PosixReplacer {
    fn replace(&self, script: &Path, shell: &ShellDescriptor) -> Result<Infallible, ExecError> {
        check_preconditions(script, shell)?;

        log_component!(
            debug,
            "replacer",
            "executing transition script",
            script = %script.display(),
            shell = %shell.path().display(),
            interpreter = %self.interpreter.display()
        );

        // Only returns on failure.
        let source = Command::new(&self.interpreter).arg(script).exec();
        Err(ExecError::Exec {
            interpreter: self.interpreter.clone(),
            source,
        })
    }
}

/// Everything that must hold before the irreversible exec is attempted.
pub fn check_preconditions(script: &Path, shell: &ShellDescriptor) -> Result<(), ExecError> {
    if script.as_os_str().is_empty() {
        return Err(ExecError::EmptyScriptPath);
    }
    if !shell.is_valid() {
        return Err(ExecError::InvalidShell(shell.path().to_path_buf()));
    }

    let meta = fs::metadata(script).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ExecError::ScriptNotFound(script.to_path_buf()),
        _ => ExecError::ScriptUnreadable {
            path: script.to_path_buf(),
            source,
        },
    })?;
    if !meta.is_file() {
        return Err(ExecError::ScriptNotRegularFile(script.to_path_buf()));
    }
    if meta.permissions().mode() & 0o111 == 0 {
        return Err(ExecError::ScriptNotExecutable(script.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn executable(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn valid_shell(dir: &Path) -> ShellDescriptor {
        let descriptor = ShellDescriptor::inspect(executable(dir, "shell", 0o755));
        assert!(descriptor.is_valid());
        descriptor
    }

    #[test]
    fn test_preconditions_pass() {
        let dir = TempDir::new().unwrap();
        let script = executable(dir.path(), "exitcd_ok.sh", 0o700);
        assert!(check_preconditions(&script, &valid_shell(dir.path())).is_ok());
    }

    #[test]
    fn test_empty_script_path() {
        let dir = TempDir::new().unwrap();
        let err = check_preconditions(Path::new(""), &valid_shell(dir.path())).unwrap_err();
        assert!(matches!(err, ExecError::EmptyScriptPath));
    }

    #[test]
    fn test_invalid_shell() {
        let dir = TempDir::new().unwrap();
        let script = executable(dir.path(), "exitcd_ok.sh", 0o700);
        let err = check_preconditions(&script, &ShellDescriptor::invalid("/no/shell")).unwrap_err();
        assert!(matches!(err, ExecError::InvalidShell(_)));
    }

    #[test]
    fn test_missing_script() {
        let dir = TempDir::new().unwrap();
        let err = check_preconditions(&dir.path().join("gone.sh"), &valid_shell(dir.path()))
            .unwrap_err();
        assert!(matches!(err, ExecError::ScriptNotFound(_)));
    }

    #[test]
    fn test_directory_script() {
        let dir = TempDir::new().unwrap();
        let err = check_preconditions(dir.path(), &valid_shell(dir.path())).unwrap_err();
        assert!(matches!(err, ExecError::ScriptNotRegularFile(_)));
    }

    #[test]
    fn test_non_executable_script() {
        let dir = TempDir::new().unwrap();
        let script = executable(dir.path(), "exitcd_noexec.sh", 0o600);
        let err = check_preconditions(&script, &valid_shell(dir.path())).unwrap_err();
        assert!(matches!(err, ExecError::ScriptNotExecutable(_)));
    }

    #[test]
    fn test_exec_failure_returns_control() {
        let dir = TempDir::new().unwrap();
        let script = executable(dir.path(), "exitcd_ok.sh", 0o700);
        let replacer = PosixReplacer::with_interpreter(dir.path().join("no-such-interpreter"));

        let err = replacer
            .replace(&script, &valid_shell(dir.path()))
            .unwrap_err();

        assert!(matches!(err, ExecError::Exec { .. }));
        assert!(script.exists());
    }

    #[test]
    fn test_default_interpreter_is_bin_sh() {
        assert_eq!(PosixReplacer::new().interpreter(), Path::new("/bin/sh"));
    }
}
