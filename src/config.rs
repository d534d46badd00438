/*!
 * Configuration types for Webinator
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::walker::{IgnoreSet, DEFAULT_IGNORE_PATTERNS};
use crate::error::{Result, WebinatorError};

/// Upper bound on concurrent file workers
pub const MAX_WORKERS: usize = 64;

/// Main configuration for sync runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of files fingerprinted and uploaded concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Error handling mode
    #[serde(default)]
    pub error_mode: ErrorMode,

    /// File-name glob patterns that are never uploaded
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Decide and report, but do not upload
    #[serde(default)]
    pub dry_run: bool,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            error_mode: ErrorMode::default(),
            ignore_patterns: default_ignore_patterns(),
            dry_run: false,
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

/// Error handling mode determines behavior when a single file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Report the failure and continue with the next file
    #[default]
    Skip,

    /// Stop starting new files after the first failure
    Abort,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_workers() -> usize {
    4
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl SyncConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(WebinatorError::Config(
                "workers must be at least 1".to_string(),
            ));
        }

        if self.workers > MAX_WORKERS {
            return Err(WebinatorError::Config(format!(
                "workers {} exceeds maximum {}",
                self.workers, MAX_WORKERS
            )));
        }

        self.ignore_set()?;
        Ok(())
    }

    /// Compile the ignore patterns
    pub fn ignore_set(&self) -> Result<IgnoreSet> {
        IgnoreSet::new(&self.ignore_patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.error_mode, ErrorMode::Skip);
        assert_eq!(config.ignore_patterns, vec![".DS_Store".to_string()]);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SyncConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(WebinatorError::Config(_))));
    }

    #[test]
    fn test_too_many_workers_rejected() {
        let config = SyncConfig {
            workers: MAX_WORKERS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let config = SyncConfig {
            ignore_patterns: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str("workers = 8\nerror_mode = \"abort\"\n").unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.error_mode, ErrorMode::Abort);
        assert_eq!(config.ignore_patterns, default_ignore_patterns());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webinator.toml");

        let config = SyncConfig {
            workers: 2,
            dry_run: true,
            ignore_patterns: vec![".DS_Store".to_string(), "*.swp".to_string()],
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        assert_eq!(SyncConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
