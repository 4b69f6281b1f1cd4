//! Transition script rendering.

use std::path::{Path, PathBuf};

use crate::error::GenerateError;
use crate::log_component;
use crate::security::escape_single_quotes;
use crate::shell::ShellDescriptor;

/// Interpreter that runs every transition script, whatever the user's shell.
pub const SCRIPT_INTERPRETER: &str = "/bin/sh";

/// A rendered transition script, ready to be stored and executed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionScript {
    text: String,
    target_dir: String,
    interpreter: PathBuf,
}

impl TransitionScript {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Target directory as embedded in the script, already escaped.
    pub fn escaped_target_dir(&self) -> &str {
        &self.target_dir
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Render the script that changes into `target_dir` and then becomes `shell`.
///
/// The script removes itself before the final `exec`, since `exec` does not
/// fire an EXIT trap. The trap covers interrupts and early exits.
pub fn generate_script(
    target_dir: &Path,
    shell: &ShellDescriptor,
) -> Result<TransitionScript, GenerateError> {
    if !target_dir.is_absolute() {
        return Err(GenerateError::RelativeTarget(target_dir.to_path_buf()));
    }
    let target = target_dir
        .to_str()
        .ok_or_else(|| GenerateError::NonUtf8Path(target_dir.to_path_buf()))?;

    if shell.path().as_os_str().is_empty() {
        return Err(GenerateError::EmptyShellPath);
    }
    let shell_path = shell
        .path()
        .to_str()
        .ok_or_else(|| GenerateError::NonUtf8ShellPath(shell.path().to_path_buf()))?;

    let target_dir = escape_single_quotes(target);
    let text = render(SCRIPT_INTERPRETER, &target_dir, &escape_single_quotes(shell_path));

    log_component!(debug, "generator", "script rendered", bytes = text.len());

    Ok(TransitionScript {
        text,
        target_dir,
        interpreter: PathBuf::from(SCRIPT_INTERPRETER),
    })
}

fn render(interpreter: &str, escaped_target: &str, escaped_shell: &str) -> String {
    format!(
        r#"#!{interpreter}
# exitcd transition script - removes itself on exit
trap 'rm -f "$0" 2>/dev/null || true' EXIT INT TERM

TARGET_DIR='{escaped_target}'
SHELL_PATH='{escaped_shell}'

if cd "$TARGET_DIR" 2>/dev/null; then
    printf 'Directory changed to: %s\n' "$TARGET_DIR"
else
    printf 'Warning: Could not change to %s\n' "$TARGET_DIR" >&2
    printf 'Continuing in current directory\n' >&2
fi

rm -f "$0" 2>/dev/null
exec "$SHELL_PATH"
"#
    )
}
