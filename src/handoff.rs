//! Directory handoff orchestration
//!
//! Runs the pipeline
//! `Start -> DirectoryValidated -> ShellResolved -> ScriptGenerated -> ScriptStored -> Replaced`.
//! The first failing step ends the run with a [`HandoffError`] tagged with
//! its [`Stage`]. Stale script reconciliation runs first and never fails the run.

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{Environment, HandoffOptions, DEFAULT_STALE_SCRIPT_MAX_AGE_SECS};
use crate::diagnostics::check_shell_depth;
use crate::error::{HandoffError, Result, Stage};
use crate::log_component;
use crate::process::{PosixReplacer, ProcessReplacer};
use crate::script::{generate_script, reap_stale_scripts, ReconcileReport, ScriptStore};
use crate::security::{validate_target_path, SecurityLevel};
use crate::shell::{ShellDescriptor, ShellResolver};

/// One configured handoff. Build it, then [`run`](Handoff::run) it.
#[derive(Debug, Clone)]
pub struct Handoff<R = PosixReplacer> {
    options: HandoffOptions,
    env: Environment,
    resolver: ShellResolver,
    replacer: R,
}

impl Handoff<PosixReplacer> {
    pub fn new(options: HandoffOptions, env: Environment) -> Self {
        Self {
            options,
            env,
            resolver: ShellResolver::new(),
            replacer: PosixReplacer::new(),
        }
    }
}

impl<R: ProcessReplacer> Handoff<R> {
    pub fn with_resolver(mut self, resolver: ShellResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_replacer<R2: ProcessReplacer>(self, replacer: R2) -> Handoff<R2> {
        Handoff {
            options: self.options,
            env: self.env,
            resolver: self.resolver,
            replacer,
        }
    }

    pub fn options(&self) -> &HandoffOptions {
        &self.options
    }

    fn debug_enabled(&self) -> bool {
        self.options.debug || self.env.debug
    }

    /// Hand `target` to a new shell. Returns only on failure.
    pub fn run(&self, target: &str) -> Result<Infallible> {
        check_shell_depth(&self.options, &self.env);
        self.reconcile();

        let validated = validate_target_path(
            target,
            self.options.security_level,
            self.env.current_dir.as_deref(),
        )
        .map_err(|e| HandoffError::path_validation(target, e).at_stage(Stage::Validation))?;
        log_component!(debug, "handoff", "directory validated", path = %validated.display());

        let shell = self.resolver.resolve(self.options.shell_override(), &self.env);
        if !shell.is_valid() {
            return Err(HandoffError::shell_not_found(shell.path()).at_stage(Stage::ShellResolution));
        }
        log_component!(
            debug,
            "handoff",
            "shell resolved",
            shell = %shell.path().display(),
            kind = %shell.kind()
        );

        let script = generate_script(&validated, &shell)
            .map_err(|e| HandoffError::script_generation(e).at_stage(Stage::Generation))?;
        log_component!(debug, "handoff", "script generated");

        let stored = self
            .store()
            .persist(&script)
            .map_err(|e| HandoffError::script_creation(e).at_stage(Stage::Storage))?;
        log_component!(debug, "handoff", "script stored", path = %stored.path().display());

        match self.replacer.replace(stored.path(), &shell) {
            Ok(never) => match never {},
            Err(e) => {
                // The script never ran, so its own trap will not clean up.
                if let Err(rm) = stored.remove() {
                    self.cleanup_warning(stored.path(), &rm);
                }
                Err(HandoffError::script_execution(stored.path(), e).at_stage(Stage::Replacement))
            }
        }
    }

    fn store(&self) -> ScriptStore {
        ScriptStore::new(
            self.options.temp_dir_override(),
            self.env.current_dir.as_deref(),
        )
    }

    /// Sweep stale scripts from the system temp dir and the configured one.
    fn reconcile(&self) -> ReconcileReport {
        let max_age = self.options.stale_script_max_age();
        let mut dirs = vec![std::env::temp_dir()];
        if self.options.temp_dir_override().is_some() {
            let custom = self.store().dir().to_path_buf();
            if custom != dirs[0] {
                dirs.push(custom);
            }
        }

        let mut report = ReconcileReport::default();
        for dir in dirs {
            match reap_stale_scripts(&dir, max_age) {
                Ok(r) => report = report.merge(r),
                Err(e) => self.cleanup_warning(&dir, &e),
            }
        }
        report
    }

    fn cleanup_warning(&self, path: &Path, err: &io::Error) {
        if self.debug_enabled() {
            warn!("exitcd: cleanup warning for {}: {}", path.display(), err);
        } else {
            debug!("exitcd: cleanup warning for {}: {}", path.display(), err);
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Change the parent shell's directory to `target` by replacing this process.
///
/// Uses default options and the current environment; `EXITCD_DEBUG` turns
/// on debug diagnostics. Returns only on failure, leaving this process intact.
///
/// ```no_run
/// if let Err(err) = exitcd::exit_with_directory("/some/target/directory") {
///     eprintln!("exitcd failed: {}", err);
///     std::process::exit(1);
/// }
/// ```
pub fn exit_with_directory(target: &str) -> Result<Infallible> {
    run_with_defaults(target, Environment::capture())
}

fn run_with_defaults(target: &str, env: Environment) -> Result<Infallible> {
    let options = HandoffOptions {
        debug: env.debug,
        ..Default::default()
    };
    Handoff::new(options, env).run(target)
}

/// [`exit_with_directory`] with explicit options and environment snapshot.
pub fn exit_with_directory_advanced(
    target: &str,
    options: &HandoffOptions,
    env: &Environment,
) -> Result<Infallible> {
    Handoff::new(options.clone(), env.clone()).run(target)
}

/// Hand off to `target`, or run `fallback` and exit with status 1.
pub fn exit_with_directory_or_fallback<F: FnOnce()>(target: &str, fallback: F) -> ! {
    let env = Environment::capture();
    let debug = env.debug;
    if let Err(err) = run_with_defaults(target, env) {
        if debug {
            eprintln!("exitcd failed: {}", err);
        }
        fallback();
    }
    std::process::exit(1)
}

/// Run only the validation step.
pub fn validate_directory(target: &str, level: SecurityLevel) -> Result<PathBuf> {
    validate_target_path(target, level, None)
        .map_err(|e| HandoffError::path_validation(target, e).at_stage(Stage::Validation))
}

/// Returns `true` if the environment yields a usable shell to hand off to.
pub fn is_supported(env: &Environment) -> bool {
    current_shell_info(env).is_valid()
}

/// The shell auto-detection would pick, without any override.
pub fn current_shell_info(env: &Environment) -> ShellDescriptor {
    ShellResolver::new().resolve(None, env)
}

/// Remove scripts older than 24 hours from the system temp directory.
pub fn cleanup_old_scripts() -> io::Result<ReconcileReport> {
    cleanup_old_scripts_with_age(None, Duration::from_secs(DEFAULT_STALE_SCRIPT_MAX_AGE_SECS))
}

/// Remove scripts older than `max_age` from `dir`, or the system temp directory.
pub fn cleanup_old_scripts_with_age(
    dir: Option<&Path>,
    max_age: Duration,
) -> io::Result<ReconcileReport> {
    let dir = dir
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    reap_stale_scripts(&dir, max_age)
}
