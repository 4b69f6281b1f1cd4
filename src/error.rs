//! Error types for exitcd
//!
//! Every component has its own `thiserror` enum describing what went wrong
//! locally. The orchestrator wraps those into [`HandoffError`], the single
//! structured error callers ever see.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Classification
// ============================================================================

/// Category of a [`HandoffError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target directory does not exist
    PathNotFound,
    /// Target exists but is not a directory
    PathNotDirectory,
    /// Target directory cannot be listed (permissions, or it vanished mid-check)
    PathNotAccessible,
    /// Validation policy rejected the shape of the path
    SecurityViolation,
    /// No usable shell to hand control to
    ShellNotFound,
    /// The transition script could not be rendered
    ScriptGeneration,
    /// The script could not be stored or executed
    ScriptExecution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::PathNotFound => "path not found",
            ErrorKind::PathNotDirectory => "path not a directory",
            ErrorKind::PathNotAccessible => "path not accessible",
            ErrorKind::SecurityViolation => "security violation",
            ErrorKind::ShellNotFound => "shell not found",
            ErrorKind::ScriptGeneration => "script generation",
            ErrorKind::ScriptExecution => "script execution",
        };
        f.write_str(name)
    }
}

/// Pipeline step that was running when a handoff stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    ShellResolution,
    Generation,
    Storage,
    Replacement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::ShellResolution => "shell resolution",
            Stage::Generation => "generation",
            Stage::Storage => "storage",
            Stage::Replacement => "replacement",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Component errors
// ============================================================================

/// Path Validator failures.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("invalid path: {0}")]
    Unresolvable(#[source] io::Error),

    #[error("path does not exist")]
    NotFound,

    #[error("path is not a directory")]
    NotDirectory,

    #[error("path is not accessible: {0}")]
    NotAccessible(#[source] io::Error),

    #[error("security violation: {0}")]
    SecurityViolation(String),
}

/// Script Generator failures.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("target directory is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("target directory must be absolute: {}", .0.display())]
    RelativeTarget(PathBuf),

    #[error("shell path is empty")]
    EmptyShellPath,

    #[error("shell path is not valid UTF-8: {}", .0.display())]
    NonUtf8ShellPath(PathBuf),
}

/// Script Store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create temp file in {}: {source}", dir.display())]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write script: {0}")]
    Write(#[source] io::Error),

    #[error("failed to set permissions: {0}")]
    Permissions(#[source] io::Error),

    #[error("failed to persist script: {0}")]
    Persist(#[source] io::Error),
}

/// Process Replacer failures. Any of these means the caller is still alive.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("script path is empty")]
    EmptyScriptPath,

    #[error("script file does not exist: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("script path is not a regular file: {}", .0.display())]
    ScriptNotRegularFile(PathBuf),

    #[error("script file is not executable: {}", .0.display())]
    ScriptNotExecutable(PathBuf),

    #[error("unable to access script {}: {source}", path.display())]
    ScriptUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shell is not valid: {}", .0.display())]
    InvalidShell(PathBuf),

    #[error("exec of {} failed: {source}", interpreter.display())]
    Exec {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Config file loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// Structured error returned by every fallible public operation.
#[derive(Debug)]
pub struct HandoffError {
    kind: ErrorKind,
    message: String,
    path: Option<PathBuf>,
    stage: Option<Stage>,
    source: Option<BoxError>,
}

impl HandoffError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            stage: None,
            source: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn at_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Wrap a validator failure for the path the caller asked for.
    pub fn path_validation(requested: impl Into<PathBuf>, cause: PathError) -> Self {
        let kind = match &cause {
            PathError::Unresolvable(_) | PathError::NotFound => ErrorKind::PathNotFound,
            PathError::NotDirectory => ErrorKind::PathNotDirectory,
            PathError::NotAccessible(_) => ErrorKind::PathNotAccessible,
            PathError::SecurityViolation(_) => ErrorKind::SecurityViolation,
        };
        Self::new(kind, format!("exitcd: path validation failed: {}", cause))
            .with_path(requested)
            .with_source(cause)
    }

    pub fn shell_not_found(shell_path: &Path) -> Self {
        Self::new(
            ErrorKind::ShellNotFound,
            format!(
                "exitcd: shell detection failed: no valid shell found (tried {})",
                shell_path.display()
            ),
        )
        .with_path(shell_path)
    }

    pub fn script_generation(cause: GenerateError) -> Self {
        Self::new(
            ErrorKind::ScriptGeneration,
            format!("exitcd: script generation failed: {}", cause),
        )
        .with_source(cause)
    }

    pub fn script_creation(cause: StoreError) -> Self {
        let dir = match &cause {
            StoreError::Create { dir, .. } => Some(dir.clone()),
            _ => None,
        };
        let err = Self::new(
            ErrorKind::ScriptExecution,
            format!("exitcd: script creation failed: {}", cause),
        )
        .with_source(cause);
        match dir {
            Some(dir) => err.with_path(dir),
            None => err,
        }
    }

    pub fn script_execution(script_path: &Path, cause: ExecError) -> Self {
        Self::new(
            ErrorKind::ScriptExecution,
            format!("exitcd: script execution failed: {}", cause),
        )
        .with_path(script_path)
        .with_source(cause)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Offending path, when the failure concerns one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Returns `true` if the caller can reasonably fall back to staying put.
    ///
    /// Only a missing shell is fatal: there is nothing to hand control to,
    /// so every fallback is equally degraded.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind, ErrorKind::ShellNotFound)
    }

    pub fn is_path_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::PathNotFound
                | ErrorKind::PathNotDirectory
                | ErrorKind::PathNotAccessible
                | ErrorKind::SecurityViolation
        )
    }

    pub fn is_shell_error(&self) -> bool {
        self.kind == ErrorKind::ShellNotFound
    }

    pub fn is_script_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ScriptGeneration | ErrorKind::ScriptExecution
        )
    }
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandoffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A specialized `Result` type for exitcd operations.
pub type Result<T> = std::result::Result<T, HandoffError>;
