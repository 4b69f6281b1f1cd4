//! Configuration types for exitcd.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::security::SecurityLevel;

/// Depth at which the nesting hint kicks in when no threshold is configured.
pub const DEFAULT_DEPTH_WARNING_THRESHOLD: u32 = 15;

/// Stored scripts older than this are reaped by the reconciliation pass.
pub const DEFAULT_STALE_SCRIPT_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Root configuration, as stored in `~/.exitcd/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub handoff: HandoffOptions,
    pub logging: LoggingConfig,
}

// ============================================================================
// Handoff Options
// ============================================================================

/// Option bundle for a single directory handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffOptions {
    /// Shell name or absolute path; `None` or empty means auto-detect
    pub shell: Option<String>,
    pub security_level: SecurityLevel,
    /// Verbose diagnostics on stderr
    pub debug: bool,
    /// Directory for transition scripts; `None` or empty means system temp
    pub temp_dir: Option<PathBuf>,
    /// SHLVL at or above which the nesting hint is printed (0 means default)
    pub depth_warning_threshold: u32,
    pub disable_depth_warnings: bool,
    /// Age after which leftover scripts are deleted by the reconciliation pass
    pub stale_script_max_age_secs: u64,
}

impl Default for HandoffOptions {
    fn default() -> Self {
        Self {
            shell: None,
            security_level: SecurityLevel::Normal,
            debug: false,
            temp_dir: None,
            depth_warning_threshold: DEFAULT_DEPTH_WARNING_THRESHOLD,
            disable_depth_warnings: false,
            stale_script_max_age_secs: DEFAULT_STALE_SCRIPT_MAX_AGE_SECS,
        }
    }
}

impl HandoffOptions {
    pub fn shell_override(&self) -> Option<&str> {
        self.shell.as_deref().filter(|s| !s.is_empty())
    }

    pub fn temp_dir_override(&self) -> Option<&Path> {
        self.temp_dir
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn effective_depth_threshold(&self) -> u32 {
        if self.depth_warning_threshold == 0 {
            DEFAULT_DEPTH_WARNING_THRESHOLD
        } else {
            self.depth_warning_threshold
        }
    }

    pub fn stale_script_max_age(&self) -> Duration {
        Duration::from_secs(self.stale_script_max_age_secs)
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Output format for the tracing subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Component,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "component" => Ok(LogFormat::Component),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "warn".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_options_defaults() {
        let opts = HandoffOptions::default();
        assert_eq!(opts.security_level, SecurityLevel::Normal);
        assert_eq!(opts.depth_warning_threshold, 15);
        assert_eq!(opts.stale_script_max_age(), Duration::from_secs(86_400));
        assert!(opts.shell_override().is_none());
        assert!(opts.temp_dir_override().is_none());
        assert!(!opts.debug);
    }

    #[test]
    fn test_empty_overrides_mean_auto() {
        let opts = HandoffOptions {
            shell: Some(String::new()),
            temp_dir: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(opts.shell_override().is_none());
        assert!(opts.temp_dir_override().is_none());
    }

    #[test]
    fn test_zero_threshold_uses_default() {
        let opts = HandoffOptions {
            depth_warning_threshold: 0,
            ..Default::default()
        };
        assert_eq!(opts.effective_depth_threshold(), 15);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: HandoffOptions =
            serde_json::from_str(r#"{"security_level":"strict","shell":"zsh"}"#).unwrap();
        assert_eq!(opts.security_level, SecurityLevel::Strict);
        assert_eq!(opts.shell_override(), Some("zsh"));
        assert_eq!(opts.depth_warning_threshold, 15);
    }

    #[test]
    fn test_default_logging_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.format, LogFormat::Component);
        assert_eq!(cfg.level, "warn");
        assert!(cfg.file.is_none());
    }

    #[test]
    fn test_log_format_deserialize() {
        let cfg: LoggingConfig =
            serde_json::from_str(r#"{"format":"json","level":"debug"}"#).unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.level, "debug");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
