//! Read-only commands: `exitcd check` and `exitcd shell`.

use exitcd::security::validate_target_path;
use exitcd::{Environment, HandoffError, SecurityLevel, ShellResolver, Stage};

/// Validate `dir` and print the normalized path. Exits 1 when invalid.
pub(crate) fn cmd_check(dir: &str, level: SecurityLevel, env: &Environment) {
    match validate_target_path(dir, level, env.current_dir.as_deref()) {
        Ok(path) => println!("[OK] {}", path.display()),
        Err(e) => {
            let err = HandoffError::path_validation(dir, e).at_stage(Stage::Validation);
            println!("[ERROR] {} ({})", err, err.kind());
            std::process::exit(1);
        }
    }
}

/// Print the shell a handoff would start. Exits 2 when none is usable.
pub(crate) fn cmd_shell(shell: Option<&str>, env: &Environment) {
    let descriptor = ShellResolver::new().resolve(shell, env);
    println!("Shell: {}", descriptor.path().display());
    println!("Kind:  {}", descriptor.kind());
    if descriptor.is_valid() {
        println!("[OK] executable");
    } else {
        println!("[ERROR] not an executable file");
        std::process::exit(2);
    }
}
