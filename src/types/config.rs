//! Bot configuration.
//!
//! Durations handed to every new session, plus the completion watcher's
//! polling interval. Values can come from a JSON file and be overridden
//! on the command line.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_work_minutes() -> u32 {
    25
}

fn default_break_minutes() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Errors raised while loading or validating a [`BotConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("work duration must be between 1 and 120 minutes (got {0})")]
    InvalidWorkMinutes(u32),

    #[error("break duration must be between 1 and 60 minutes (got {0})")]
    InvalidBreakMinutes(u32),

    #[error("poll interval must be between 10 and 60000 ms (got {0})")]
    InvalidPollInterval(u64),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Default durations for new sessions.
///
/// # Example
///
/// ```
/// use pomobot::types::BotConfig;
///
/// let config = BotConfig::default();
/// assert_eq!(config.work_minutes, 25);
/// assert_eq!(config.break_minutes, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Work phase length in minutes (1-120)
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,

    /// Break phase length in minutes (1-60)
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,

    /// How often completion watchers re-check their timer, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overrides `work_minutes` with a sub-minute span. Not serialized;
    /// used by tests that need phases measured in seconds.
    #[serde(skip)]
    pub work_override: Option<Duration>,

    /// Overrides `break_minutes`, see `work_override`.
    #[serde(skip)]
    pub break_override: Option<Duration>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            poll_interval_ms: default_poll_interval_ms(),
            work_override: None,
            break_override: None,
        }
    }
}

impl BotConfig {
    /// Loads a configuration from a JSON file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: BotConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration with the specified work duration.
    #[must_use]
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a configuration with the specified break duration.
    #[must_use]
    pub fn with_break_minutes(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Creates a configuration with the specified watcher poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Uses exact spans for both phases instead of whole minutes.
    #[must_use]
    pub fn with_durations(mut self, work: Duration, brk: Duration) -> Self {
        self.work_override = Some(work);
        self.break_override = Some(brk);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=120).contains(&self.work_minutes) {
            return Err(ConfigError::InvalidWorkMinutes(self.work_minutes));
        }
        if !(1..=60).contains(&self.break_minutes) {
            return Err(ConfigError::InvalidBreakMinutes(self.break_minutes));
        }
        if !(10..=60_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::InvalidPollInterval(self.poll_interval_ms));
        }
        Ok(())
    }

    /// Length of a work phase.
    pub fn work_duration(&self) -> Duration {
        self.work_override
            .unwrap_or_else(|| Duration::from_secs(u64::from(self.work_minutes) * 60))
    }

    /// Length of a break phase.
    pub fn break_duration(&self) -> Duration {
        self.break_override
            .unwrap_or_else(|| Duration::from_secs(u64::from(self.break_minutes) * 60))
    }

    /// Watcher polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
