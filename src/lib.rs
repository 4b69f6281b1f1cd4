//! exitcd - hand a terminal program's final working directory to its shell
//!
//! A child process cannot change its parent shell's working directory. A
//! program can instead replace itself with a short transition script that
//! changes directory and then `exec`s the user's shell, so control comes back
//! to an interactive shell already sitting in the target directory.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handoff;
pub mod process;
pub mod script;
pub mod security;
pub mod shell;
pub mod utils;

pub use config::{Config, Environment, HandoffOptions};
pub use error::{ErrorKind, HandoffError, Result, Stage};
pub use handoff::{
    cleanup_old_scripts, cleanup_old_scripts_with_age, current_shell_info, exit_with_directory,
    exit_with_directory_advanced, exit_with_directory_or_fallback, is_supported,
    validate_directory, Handoff,
};
pub use process::{PosixReplacer, ProcessReplacer};
pub use script::{ReconcileReport, ScriptStore, TemporaryScriptFile, TransitionScript};
pub use security::SecurityLevel;
pub use shell::{ShellDescriptor, ShellKind, ShellResolver};
