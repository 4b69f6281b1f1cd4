//! `exitcd cd` command handler.

use exitcd::config::{Config, HandoffOptions};
use exitcd::{Environment, Handoff};

use super::HandoffArgs;

/// Merge command-line overrides over the configured options.
pub(crate) fn resolve_options(args: &HandoffArgs, config: &Config) -> HandoffOptions {
    let mut options = config.handoff.clone();
    if let Some(shell) = &args.shell {
        options.shell = Some(shell.clone());
    }
    if let Some(level) = args.security_level {
        options.security_level = level.into();
    }
    if args.debug {
        options.debug = true;
    }
    if let Some(dir) = &args.temp_dir {
        options.temp_dir = Some(dir.clone());
    }
    if let Some(threshold) = args.depth_warning_threshold {
        options.depth_warning_threshold = threshold;
    }
    if args.no_depth_warning {
        options.disable_depth_warnings = true;
    }
    options
}

/// Hand off to `dir`. Only comes back to exit the process on failure.
pub(crate) fn cmd_cd(dir: &str, args: &HandoffArgs, config: &Config, env: Environment) -> ! {
    let options = resolve_options(args, config);
    let err = match Handoff::new(options, env).run(dir) {
        Ok(never) => match never {},
        Err(err) => err,
    };

    eprintln!("{}", err);
    let code = if err.is_recoverable() { 1 } else { 2 };
    std::process::exit(code)
}
