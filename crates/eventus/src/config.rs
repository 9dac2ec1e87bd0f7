//! Bus configuration.
//!
//! Runtime options live in [`BusConfig`]. It deserializes from TOML with
//! every field optional, so an empty table yields the defaults:
//!
//! ```toml
//! gc = true          # drop empty event buckets after each mutation
//! workers = 4        # worker pool size; omitted = host concurrency
//! debug_log = false  # route debug records to `tracing`
//! ```
//!
//! Thread safety is chosen at build time with the `thread-safe` and
//! `threading` cargo features.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding [`BusConfig::gc`].
pub const ENV_GC: &str = "EVENTUS_GC";
/// Environment variable overriding [`BusConfig::workers`].
pub const ENV_WORKERS: &str = "EVENTUS_WORKERS";
/// Environment variable overriding [`BusConfig::debug_log`].
pub const ENV_DEBUG_LOG: &str = "EVENTUS_DEBUG_LOG";

/// Maximum accepted config file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the config file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        /// Path (or `<string>`) of the source that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },

    /// Environment variable could not be applied.
    #[error("Environment variable '{var_name}': {message}")]
    EnvError {
        /// Name of the environment variable.
        var_name: String,
        /// Error description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime options for a [`Bus`](crate::Bus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Remove empty event buckets after every structural mutation.
    ///
    /// Disable for workloads that repeatedly subscribe and unsubscribe the
    /// same event type.
    pub gc: bool,
    /// Number of worker threads. `None` uses the host's available
    /// parallelism.
    pub workers: Option<usize>,
    /// Install a [`TracingSink`](crate::TracingSink) at construction.
    pub debug_log: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            gc: true,
            workers: None,
            debug_log: false,
        }
    }
}

impl BusConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable bucket garbage collection.
    #[must_use]
    pub fn with_gc(mut self, gc: bool) -> Self {
        self.gc = gc;
        self
    }

    /// Set an explicit worker pool size.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Enable or disable the default `tracing` log sink.
    #[must_use]
    pub fn with_debug_log(mut self, debug_log: bool) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for malformed TOML and
    /// [`ConfigError::ValidationError`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        Self::parse(source, "<string>")
    }

    /// Load, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read, plus
    /// every error [`BusConfig::from_toml_str`] can return.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::ValidationError {
                field: path.display().to_string(),
                message: format!(
                    "config file is {} bytes, exceeding the {} byte limit",
                    metadata.len(),
                    MAX_CONFIG_FILE_SIZE
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config = Self::parse(&content, &path.display().to_string())?;
        debug!(path = %path.display(), "loaded bus config");
        Ok(config)
    }

    fn parse(source: &str, path: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::ParseError {
            path: path.to_owned(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `EVENTUS_*` overrides from the given variables.
    ///
    /// Returns the number of overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvError`] if a variable holds an unparseable
    /// value, and [`ConfigError::ValidationError`] if the result is invalid.
    pub fn apply_env_overrides<S: std::hash::BuildHasher>(
        &mut self,
        env_vars: &HashMap<String, String, S>,
    ) -> ConfigResult<usize> {
        let mut count: usize = 0;

        if let Some(val) = env_vars.get(ENV_GC) {
            self.gc = parse_bool(ENV_GC, val)?;
            count = count.saturating_add(1);
        }

        if let Some(val) = env_vars.get(ENV_WORKERS) {
            let workers = val.trim().parse::<usize>().map_err(|e| ConfigError::EnvError {
                var_name: ENV_WORKERS.to_owned(),
                message: format!("expected a positive integer, got '{val}': {e}"),
            })?;
            self.workers = Some(workers);
            count = count.saturating_add(1);
        }

        if let Some(val) = env_vars.get(ENV_DEBUG_LOG) {
            self.debug_log = parse_bool(ENV_DEBUG_LOG, val)?;
            count = count.saturating_add(1);
        }

        if count > 0 {
            debug!(count, "applied environment overrides to bus config");
        }
        self.validate()?;
        Ok(count)
    }

    /// Apply `EVENTUS_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`BusConfig::apply_env_overrides`].
    pub fn with_env_overrides(mut self) -> ConfigResult<Self> {
        let env_vars: HashMap<String, String> = std::env::vars().collect();
        self.apply_env_overrides(&env_vars)?;
        Ok(self)
    }

    /// Check that every value is within range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if `workers` is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == Some(0) {
            return Err(ConfigError::ValidationError {
                field: "workers".to_owned(),
                message: "worker pool size must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Worker pool size after resolving the host default.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }
}

fn parse_bool(var_name: &str, val: &str) -> ConfigResult<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::EnvError {
            var_name: var_name.to_owned(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = BusConfig::default();
        assert!(config.gc);
        assert_eq!(config.workers, None);
        assert!(!config.debug_log);
        assert!(config.resolved_workers() >= 1);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = BusConfig::from_toml_str("").unwrap();
        assert_eq!(config, BusConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = BusConfig::from_toml_str("gc = false\nworkers = 3\ndebug_log = true").unwrap();
        assert!(!config.gc);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.resolved_workers(), 3);
        assert!(config.debug_log);
    }

    #[test]
    fn test_parse_error() {
        let err = BusConfig::from_toml_str("gc = \"maybe\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = BusConfig::from_toml_str("workers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "workers"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BusConfig::default();
        let env = make_env(&[(ENV_GC, "off"), (ENV_WORKERS, " 2 "), ("UNRELATED", "x")]);

        let count = config.apply_env_overrides(&env).unwrap();

        assert_eq!(count, 2);
        assert!(!config.gc);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = BusConfig::default();
        let env = make_env(&[(ENV_DEBUG_LOG, "sometimes")]);

        let err = config.apply_env_overrides(&env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == ENV_DEBUG_LOG));
    }

    #[test]
    fn test_env_override_validates() {
        let mut config = BusConfig::default();
        let env = make_env(&[(ENV_WORKERS, "0")]);
        assert!(matches!(
            config.apply_env_overrides(&env),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_round_trip_serialize() {
        let config = BusConfig::new().with_gc(false).with_workers(8);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(BusConfig::from_toml_str(&text).unwrap(), config);
    }
}
