//! Configuration management for exitcd
//!
//! Configuration is loaded from `~/.exitcd/config.json` with environment
//! variable overrides. The ambient environment the pipeline consumes
//! (`SHELL`, `PATH`, `SHLVL`) is captured separately in [`Environment`].

mod environment;
mod types;
pub mod validate;

pub use environment::{Environment, DEBUG_ENV, OVERRIDE_PREFIX};
pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

impl Config {
    /// Returns the exitcd configuration directory path (~/.exitcd)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".exitcd")
    }

    /// Returns the path to the config file (~/.exitcd/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with overrides from `env`.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load(env: &Environment) -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path(), env)
    }

    /// Load configuration from a specific path with overrides from `env`.
    pub fn load_from_path(path: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|key| env.var(key));

        Ok(config)
    }

    /// Apply `EXITCD_*` overrides, looking values up through `lookup`.
    ///
    /// Unparseable numeric or enum values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("EXITCD_SHELL") {
            self.handoff.shell = Some(val);
        }
        if let Some(val) = lookup("EXITCD_SECURITY_LEVEL") {
            if let Ok(level) = val.parse() {
                self.handoff.security_level = level;
            }
        }
        if let Some(val) = lookup("EXITCD_TEMP_DIR") {
            self.handoff.temp_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup(DEBUG_ENV) {
            if !val.is_empty() {
                self.handoff.debug = true;
            }
        }
        if let Some(val) = lookup("EXITCD_DEPTH_WARNING_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.handoff.depth_warning_threshold = v;
            }
        }

        if let Some(val) = lookup("EXITCD_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("EXITCD_LOG_FORMAT") {
            if let Ok(format) = val.parse() {
                self.logging.format = format;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityLevel;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_path_under_dir() {
        assert!(Config::path().starts_with(Config::dir()));
        assert!(Config::path().ends_with("config.json"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent.json");
        let config = Config::load_from_path(&absent, &Environment::default()).unwrap();
        assert_eq!(config.handoff.security_level, SecurityLevel::Normal);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"handoff":{"security_level":"permissive","depth_warning_threshold":4},"logging":{"level":"info"}}"#,
        )
        .unwrap();
        let config = Config::load_from_path(&path, &Environment::default()).unwrap();
        assert_eq!(config.handoff.security_level, SecurityLevel::Permissive);
        assert_eq!(config.handoff.depth_warning_threshold, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from_path(&path, &Environment::default()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup_from(&[
            ("EXITCD_SHELL", "fish"),
            ("EXITCD_SECURITY_LEVEL", "strict"),
            ("EXITCD_TEMP_DIR", "/var/tmp"),
            ("EXITCD_DEBUG", "1"),
            ("EXITCD_DEPTH_WARNING_THRESHOLD", "7"),
            ("EXITCD_LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.handoff.shell_override(), Some("fish"));
        assert_eq!(config.handoff.security_level, SecurityLevel::Strict);
        assert_eq!(config.handoff.temp_dir, Some(PathBuf::from("/var/tmp")));
        assert!(config.handoff.debug);
        assert_eq!(config.handoff.depth_warning_threshold, 7);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_takes_overrides_from_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"handoff":{"security_level":"normal"}}"#).unwrap();
        let env = Environment::default()
            .with_var("EXITCD_SECURITY_LEVEL", "strict")
            .with_var(DEBUG_ENV, "1");

        let config = Config::load_from_path(&path, &env).unwrap();
        assert_eq!(config.handoff.security_level, SecurityLevel::Strict);
        assert!(config.handoff.debug);
    }

    #[test]
    fn test_env_overrides_ignore_garbage() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup_from(&[
            ("EXITCD_SECURITY_LEVEL", "paranoid"),
            ("EXITCD_DEPTH_WARNING_THRESHOLD", "lots"),
            ("EXITCD_DEBUG", ""),
        ]));
        assert_eq!(config.handoff.security_level, SecurityLevel::Normal);
        assert_eq!(config.handoff.depth_warning_threshold, 15);
        assert!(!config.handoff.debug);
    }
}
