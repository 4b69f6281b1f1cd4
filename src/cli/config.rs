//! `exitcd config check` command handler.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use exitcd::config::validate::{validate_config, Diagnostic, DiagnosticLevel};
use exitcd::config::{Config, HandoffOptions};
use exitcd::Environment;

use super::ConfigAction;

/// Validate configuration file.
pub(crate) fn cmd_config(action: ConfigAction, env: &Environment) -> Result<()> {
    match action {
        ConfigAction::Check => print!("{}", check_report(&Config::path(), env)?),
    }
    Ok(())
}

/// The full `config check` report for the file at `path`.
///
/// Key-level diagnostics come from the raw JSON. When those are clean the
/// file is also loaded as typed config, so a wrongly typed value is caught
/// and the effective settings (after `EXITCD_*` overrides) are listed.
fn check_report(path: &Path, env: &Environment) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Config file: {}", path.display())?;

    if !path.exists() {
        writeln!(out, "[OK] No config file found (using defaults)")?;
        let config = Config::load_from_path(path, env)?;
        write_effective(&mut out, &config.handoff)?;
        return Ok(out);
    }

    let content = std::fs::read_to_string(path).context("Failed to read config file")?;
    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            writeln!(out, "[ERROR] Invalid JSON: {}", e)?;
            return Ok(out);
        }
    };

    let diagnostics = validate_config(&raw);
    for diag in &diagnostics {
        writeln!(out, "{}", diag)?;
    }
    let mut errors = count(&diagnostics, DiagnosticLevel::Error);
    let warnings = count(&diagnostics, DiagnosticLevel::Warn);

    if errors == 0 {
        match Config::load_from_path(path, env) {
            Ok(config) => write_effective(&mut out, &config.handoff)?,
            Err(e) => {
                writeln!(out, "[ERROR] {}", e)?;
                errors += 1;
            }
        }
    }

    if errors == 0 && warnings == 0 {
        writeln!(out, "\nConfiguration looks good!")?;
    } else {
        writeln!(out, "\nFound {} error(s), {} warning(s)", errors, warnings)?;
    }
    Ok(out)
}

fn count(diagnostics: &[Diagnostic], level: DiagnosticLevel) -> usize {
    diagnostics.iter().filter(|d| d.level == level).count()
}

fn write_effective(out: &mut String, opts: &HandoffOptions) -> std::fmt::Result {
    writeln!(out, "\nEffective handoff settings:")?;
    writeln!(out, "  security_level: {}", opts.security_level)?;
    writeln!(out, "  shell: {}", opts.shell_override().unwrap_or("$SHELL"))?;
    match opts.temp_dir_override() {
        Some(dir) => writeln!(out, "  temp_dir: {}", dir.display())?,
        None => writeln!(out, "  temp_dir: system default")?,
    }
    if opts.disable_depth_warnings {
        writeln!(out, "  depth_warning_threshold: disabled")?;
    } else {
        writeln!(
            out,
            "  depth_warning_threshold: {}",
            opts.effective_depth_threshold()
        )?;
    }
    writeln!(
        out,
        "  stale_script_max_age: {}s",
        opts.stale_script_max_age().as_secs()
    )
}
