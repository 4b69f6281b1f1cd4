//! `exitcd cleanup` command handler.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use exitcd::cleanup_old_scripts_with_age;

/// Delete transition scripts older than `max_age_hours`.
pub(crate) fn cmd_cleanup(max_age_hours: u64, temp_dir: Option<PathBuf>) -> Result<()> {
    let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));
    let dir = temp_dir.unwrap_or_else(std::env::temp_dir);

    let report = cleanup_old_scripts_with_age(Some(&dir), max_age)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    println!("Scanned {}", dir.display());
    println!(
        "Removed {} stale script(s) ({} scanned, {} failed)",
        report.removed, report.scanned, report.failed
    );
    Ok(())
}
