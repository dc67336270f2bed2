//! Runner configuration: builder defaults, validation, TOML loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Configuration for a suite run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on a single case; a case that exceeds it is reported as
    /// timed out, never left hanging
    pub case_timeout: Duration,
    /// Interval for bounded polling inside cases
    pub poll_interval: Duration,
    /// Base directory for per-case scratch space
    pub scratch_root: PathBuf,
    /// Stop at the first case that does not pass
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            case_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            scratch_root: std::env::temp_dir().join("hostbench-suite"),
            fail_fast: false,
        }
    }
}

/// On-disk shape; everything optional, merged over the defaults
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    case_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    scratch_root: Option<PathBuf>,
    fail_fast: Option<bool>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_timeout(mut self, case_timeout: Duration) -> Self {
        self.case_timeout = case_timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.case_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "case timeout must be greater than 0".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "poll interval must be greater than 0".to_string(),
            });
        }
        if self.poll_interval >= self.case_timeout {
            return Err(ConfigError::Invalid {
                reason: "poll interval must be shorter than the case timeout".to_string(),
            });
        }
        if self.scratch_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "scratch root cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Load a TOML file and merge it over the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&text)?;

        let mut config = Self::default();
        if let Some(ms) = raw.case_timeout_ms {
            config.case_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(dir) = raw.scratch_root {
            config.scratch_root = dir;
        }
        if let Some(fail_fast) = raw.fail_fast {
            config.fail_fast = fail_fast;
        }
        config.validate()?;
        Ok(config)
    }
}
