//! Snapshot of the ambient process environment.
//!
//! Captured once at the start of an invocation and passed down by reference,
//! so no pipeline step ever re-reads the environment mid-run.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// Enables debug diagnostics when set to a non-empty value.
pub const DEBUG_ENV: &str = "EXITCD_DEBUG";

/// Prefix of every variable that can override configuration.
pub const OVERRIDE_PREFIX: &str = "EXITCD_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `SHELL`, the user's preferred shell (empty counts as unset)
    pub shell: Option<String>,
    /// `PATH`, used to resolve shell overrides given by name
    pub search_path: Option<OsString>,
    /// Raw `SHLVL`
    pub shlvl: Option<String>,
    /// `EXITCD_DEBUG` was set and non-empty
    pub debug: bool,
    pub current_dir: Option<PathBuf>,
    /// Every `EXITCD_*` variable, for config overrides
    pub overrides: BTreeMap<String, String>,
}

impl Environment {
    pub fn capture() -> Self {
        // Non-UTF-8 entries are skipped rather than panicking.
        let overrides: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(key, val)| Some((key.into_string().ok()?, val.into_string().ok()?)))
            .filter(|(key, _)| key.starts_with(OVERRIDE_PREFIX))
            .collect();
        Self {
            shell: std::env::var("SHELL").ok().filter(|s| !s.is_empty()),
            search_path: std::env::var_os("PATH"),
            shlvl: std::env::var("SHLVL").ok(),
            debug: overrides.get(DEBUG_ENV).is_some_and(|v| !v.is_empty()),
            current_dir: std::env::current_dir().ok(),
            overrides,
        }
    }

    /// A captured `EXITCD_*` variable.
    pub fn var(&self, key: &str) -> Option<String> {
        self.overrides.get(key).cloned()
    }

    /// Record an `EXITCD_*` variable. Setting [`DEBUG_ENV`] also updates `debug`.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == DEBUG_ENV {
            self.debug = !value.is_empty();
        }
        self.overrides.insert(key, value);
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn with_shlvl(mut self, shlvl: impl Into<String>) -> Self {
        self.shlvl = Some(shlvl.into());
        self
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}
