//! Shell nesting hint.
//!
//! Every successful handoff starts a new shell inside the old one, so heavy
//! use stacks shells up. Past a threshold we suggest a fresh terminal.

use crate::config::{Environment, HandoffOptions};

/// The hint for the current `SHLVL`, if one is due.
///
/// Absent or non-numeric `SHLVL` never produces a hint.
pub fn shell_depth_hint(opts: &HandoffOptions, env: &Environment) -> Option<String> {
    if opts.disable_depth_warnings {
        return None;
    }
    let level: i64 = env.shlvl.as_deref()?.trim().parse().ok()?;
    if level < i64::from(opts.effective_depth_threshold()) {
        return None;
    }
    Some(format!(
        "Tip: You have {} nested shells from navigation.\n\
         For better performance, consider opening a fresh terminal.\n",
        level
    ))
}

/// Print the nesting hint to stderr when due.
pub fn check_shell_depth(opts: &HandoffOptions, env: &Environment) {
    if let Some(hint) = shell_depth_hint(opts, env) {
        eprint!("{}", hint);
    }
}
