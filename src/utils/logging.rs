//! Logging initialization for exitcd.
//!
//! Supports three formats:
//! - `pretty`: default tracing pretty-print (human-readable, coloured)
//! - `component`: `[timestamp] [LEVEL] target message {fields}`, compact and grep-friendly;
//!   use the [`log_component!`] macro to add a `component` field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators
//!
//! Everything is written to stderr. Stdout belongs to the transition script.

use std::fs::OpenOptions;
use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// `RUST_LOG` wins when set; otherwise `debug` forces the `debug` level and
/// `cfg.level` applies. Returns an error only if the log file cannot be opened.
pub fn init_logging(cfg: &LoggingConfig, debug: bool) -> io::Result<()> {
    let level = if debug { "debug" } else { cfg.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file = match &cfg.file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    // try_init: a second call (tests, embedding apps) keeps the first subscriber.
    match (cfg.format, file) {
        (LogFormat::Json, Some(file)) => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        (LogFormat::Json, None) => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init();
        }
        (LogFormat::Pretty, file) => {
            let builder = tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true);
            let _ = match file {
                Some(file) => builder.with_writer(std::sync::Mutex::new(file)).try_init(),
                None => builder.with_writer(io::stderr).try_init(),
            };
        }
        (LogFormat::Component, file) => {
            let builder = tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .with_target(true);
            let _ = match file {
                Some(file) => builder
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .try_init(),
                None => builder.with_writer(io::stderr).try_init(),
            };
        }
    }
    Ok(())
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// Extra fields use regular tracing field syntax, including `%` and `?`:
///
/// ```
/// # use exitcd::log_component;
/// log_component!(info, "store", "script written");
/// log_component!(debug, "resolver", "shell resolved", path = %"/bin/zsh", valid = true);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($fields:tt)+) => {
        tracing::$level!(component = $component, $($fields)+, $msg)
    };
}
