//! Integration tests for exitcd
//!
//! These drive the public API end to end: validation, shell resolution,
//! script generation and storage, and the replacement seam, without ever
//! replacing the test process itself.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use std::time::Duration;

use tempfile::TempDir;

use exitcd::config::Config;
use exitcd::error::ExecError;
use exitcd::script::generate_script;
use exitcd::{
    cleanup_old_scripts_with_age, validate_directory, Environment, ErrorKind, Handoff,
    HandoffOptions, ProcessReplacer, ScriptStore, SecurityLevel, ShellDescriptor, Stage,
};

/// Records the script it was handed, runs it with `/bin/sh` as a child
/// process, and then reports an exec failure so the caller survives.
#[derive(Default, Clone)]
struct RunAsChild {
    output: Rc<RefCell<Option<(PathBuf, String)>>>,
}

impl RunAsChild {
    fn take(&self) -> (PathBuf, String) {
        self.output.borrow_mut().take().expect("script ran")
    }
}

impl ProcessReplacer for RunAsChild {
    fn replace(&self, script: &Path, _shell: &ShellDescriptor) -> Result<Infallible, ExecError> {
        let out = Command::new("/bin/sh").arg(script).output().unwrap();
        *self.output.borrow_mut() = Some((
            script.to_path_buf(),
            String::from_utf8_lossy(&out.stdout).to_string(),
        ));
        Err(ExecError::Exec {
            interpreter: PathBuf::from("/bin/sh"),
            source: io::Error::from(io::ErrorKind::Other),
        })
    }
}

struct Workspace {
    _root: TempDir,
    base: PathBuf,
    scripts: PathBuf,
    shell: PathBuf,
}

fn workspace() -> Workspace {
    let root = TempDir::new().unwrap();
    let base = root.path().canonicalize().unwrap();
    let scripts = base.join("scripts");
    fs::create_dir(&scripts).unwrap();
    let shell = base.join("report-shell");
    fs::write(&shell, "#!/bin/sh\necho \"LANDED=$(pwd)\"\n").unwrap();
    fs::set_permissions(&shell, fs::Permissions::from_mode(0o755)).unwrap();
    Workspace {
        _root: root,
        base,
        scripts,
        shell,
    }
}

fn options(ws: &Workspace, level: SecurityLevel) -> HandoffOptions {
    HandoffOptions {
        security_level: level,
        temp_dir: Some(ws.scripts.clone()),
        disable_depth_warnings: true,
        ..Default::default()
    }
}

fn env(ws: &Workspace) -> Environment {
    Environment::default().with_shell(ws.shell.to_str().unwrap())
}

// ============================================================================
// End-to-end through a child interpreter
// ============================================================================

#[test]
fn test_script_lands_shell_in_target() {
    let ws = workspace();
    let target = ws.base.join("project");
    fs::create_dir(&target).unwrap();

    let replacer = RunAsChild::default();
    let err = Handoff::new(options(&ws, SecurityLevel::Normal), env(&ws))
        .with_replacer(replacer.clone())
        .run(target.to_str().unwrap())
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Replacement));

    let (script, stdout) = replacer.take();
    assert!(script.starts_with(&ws.scripts));
    assert!(stdout.contains(&format!("LANDED={}", target.display())));
}

#[test]
fn test_every_level_neutralizes_metacharacters() {
    for level in [
        SecurityLevel::Permissive,
        SecurityLevel::Normal,
        SecurityLevel::Strict,
    ] {
        let ws = workspace();
        let name = "x'; touch injected; echo '$(touch sub)`touch tick` | & < >";
        let target = ws.base.join(name);
        fs::create_dir(&target).unwrap();

        let replacer = RunAsChild::default();
        let _ = Handoff::new(options(&ws, level), env(&ws))
            .with_replacer(replacer.clone())
            .run(target.to_str().unwrap());

        let (script, stdout) = replacer.take();
        assert!(
            stdout.contains(&format!("LANDED={}", target.display())),
            "{level}: {stdout}"
        );
        assert!(stdout.contains(&format!("Directory changed to: {}", target.display())));
        for marker in ["injected", "sub", "tick"] {
            assert!(!ws.base.join(marker).exists(), "{level}: {marker}");
            assert!(!target.join(marker).exists(), "{level}: {marker}");
        }
        // The script removed itself before its final exec.
        assert!(!script.exists());
        assert_eq!(fs::read_dir(&ws.scripts).unwrap().count(), 0);
    }
}

#[test]
fn test_directory_removed_after_validation_keeps_caller_directory() {
    let ws = workspace();
    let target = ws.base.join("short-lived");
    fs::create_dir(&target).unwrap();
    let shell = ShellDescriptor::inspect(&ws.shell);

    let script = generate_script(&target, &shell).unwrap();
    let stored = ScriptStore::new(Some(&ws.scripts), None).persist(&script).unwrap();
    fs::remove_dir(&target).unwrap();

    let out = Command::new("/bin/sh")
        .arg(stored.path())
        .current_dir(&ws.base)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert!(stderr.contains("Continuing in current directory"));
    assert!(stdout.contains(&format!("LANDED={}", ws.base.display())));
    assert!(!stored.path().exists());
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn test_validation_failures_by_kind() {
    let ws = workspace();
    let file = ws.base.join("file");
    fs::write(&file, "").unwrap();

    let cases = [
        (ws.base.join("missing"), ErrorKind::PathNotFound),
        (file, ErrorKind::PathNotDirectory),
    ];
    for (path, kind) in cases {
        let err = validate_directory(path.to_str().unwrap(), SecurityLevel::Normal).unwrap_err();
        assert_eq!(err.kind(), kind, "{}", path.display());
        assert!(err.is_path_error());
        assert_eq!(err.path(), Some(path.as_path()));
    }

    let err = validate_directory("/tmp/a\0b", SecurityLevel::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SecurityViolation);
}

#[test]
fn test_unusable_shell_is_not_recoverable() {
    let ws = workspace();
    let opts = HandoffOptions {
        shell: Some(ws.base.join("no-shell").display().to_string()),
        ..options(&ws, SecurityLevel::Normal)
    };
    let err = Handoff::new(opts, env(&ws))
        .with_replacer(RunAsChild::default())
        .run(ws.base.to_str().unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShellNotFound);
    assert!(err.is_shell_error());
    assert!(!err.is_recoverable());
    assert_eq!(fs::read_dir(&ws.scripts).unwrap().count(), 0);
}

#[test]
fn test_config_file_drives_options() {
    let ws = workspace();
    let path = ws.base.join("config.json");
    fs::write(
        &path,
        format!(
            r#"{{"handoff": {{"security_level": "strict", "temp_dir": "{}"}}}}"#,
            ws.scripts.display()
        ),
    )
    .unwrap();

    let config = Config::load_from_path(&path, &Environment::default()).unwrap();
    assert_eq!(config.handoff.security_level, SecurityLevel::Strict);
    assert_eq!(config.handoff.temp_dir_override(), Some(ws.scripts.as_path()));
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_cleanup_leaves_fresh_scripts() {
    let ws = workspace();
    let script = generate_script(&ws.base, &ShellDescriptor::inspect(&ws.shell)).unwrap();
    let stored = ScriptStore::new(Some(&ws.scripts), None).persist(&script).unwrap();

    let report =
        cleanup_old_scripts_with_age(Some(&ws.scripts), Duration::from_secs(3600)).unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.removed, 0);
    assert!(stored.path().exists());
}
