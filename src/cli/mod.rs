//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod cleanup;
pub mod config;
pub mod handoff;
pub mod inspect;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::warn;

use exitcd::config::Config;
use exitcd::{Environment, SecurityLevel};

#[derive(Parser)]
#[command(name = "exitcd")]
#[command(version)]
#[command(about = "Leave a program and land your shell in another directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace this process with a shell positioned in DIR
    Cd {
        /// Target directory
        dir: String,
        #[command(flatten)]
        overrides: HandoffArgs,
    },
    /// Validate a directory without changing into it
    Check {
        /// Directory to validate
        dir: String,
        /// Validation strictness
        #[arg(long, value_enum, default_value_t = LevelArg::Normal)]
        security_level: LevelArg,
    },
    /// Show which shell a handoff would start
    Shell {
        /// Shell name or absolute path to resolve instead of $SHELL
        #[arg(long)]
        shell: Option<String>,
    },
    /// Delete leftover transition scripts
    Cleanup {
        /// Only delete scripts older than this many hours
        #[arg(long, default_value_t = 24)]
        max_age_hours: u64,
        /// Directory to sweep instead of the system temp directory
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },
    /// Validate configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Command-line overrides for the configured handoff options.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct HandoffArgs {
    /// Shell name or absolute path (default: $SHELL, then /bin/sh)
    #[arg(long)]
    pub shell: Option<String>,
    /// Validation strictness
    #[arg(long, value_enum)]
    pub security_level: Option<LevelArg>,
    /// Print diagnostics to stderr
    #[arg(long)]
    pub debug: bool,
    /// Directory for the transition script (default: system temp)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,
    /// SHLVL at which to suggest opening a fresh terminal
    #[arg(long)]
    pub depth_warning_threshold: Option<u32>,
    /// Never print the nesting hint
    #[arg(long)]
    pub no_depth_warning: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Validate config file and report issues
    Check,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LevelArg {
    Permissive,
    Normal,
    Strict,
}

impl From<LevelArg> for SecurityLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Permissive => SecurityLevel::Permissive,
            LevelArg::Normal => SecurityLevel::Normal,
            LevelArg::Strict => SecurityLevel::Strict,
        }
    }
}

/// Entry point for the CLI, called from main().
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // The environment is read exactly once; everything below uses this snapshot.
    let env = Environment::capture();

    let (config, config_err) = match Config::load(&env) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let debug = env.debug
        || config.handoff.debug
        || matches!(&cli.command, Some(Commands::Cd { overrides, .. }) if overrides.debug);
    if let Err(e) = exitcd::utils::logging::init_logging(&config.logging, debug) {
        eprintln!("exitcd: could not open log file: {}", e);
    }
    if let Some(e) = config_err {
        warn!("Ignoring unreadable config {}: {}", Config::path().display(), e);
    }

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Cd { dir, overrides }) => {
            handoff::cmd_cd(&dir, &overrides, &config, env);
        }
        Some(Commands::Check {
            dir,
            security_level,
        }) => {
            inspect::cmd_check(&dir, security_level.into(), &env);
        }
        Some(Commands::Shell { shell }) => {
            inspect::cmd_shell(shell.as_deref(), &env);
        }
        Some(Commands::Cleanup {
            max_age_hours,
            temp_dir,
        }) => {
            cleanup::cmd_cleanup(max_age_hours, temp_dir)?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action, &env)?;
        }
    }

    Ok(())
}
