//! Runtime configuration for session timing.
//!
//! # Responsibility
//! - Hold the session TTL, poll cadence and countdown warning threshold.
//! - Apply environment overrides on top of defaults.
//!
//! # Invariants
//! - Every duration is strictly positive.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const ENV_SESSION_TTL_SECS: &str = "TASKNEST_SESSION_TTL_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "TASKNEST_POLL_INTERVAL_MS";
pub const ENV_EXPIRY_WARNING_SECS: &str = "TASKNEST_EXPIRY_WARNING_SECS";

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_EXPIRY_WARNING: Duration = Duration::from_secs(5 * 60);

/// Core timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    /// Lifetime of a freshly created session record.
    pub session_ttl: Duration,
    /// Cadence of the session poll that drives the countdown.
    pub poll_interval: Duration,
    /// Countdown is flagged as a warning below this remaining time.
    pub expiry_warning: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            expiry_warning: DEFAULT_EXPIRY_WARNING,
        }
    }
}

impl CoreConfig {
    /// Builds config from defaults plus process environment overrides.
    ///
    /// # Errors
    /// - Returns `ConfigError` when an override is non-numeric or zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds config from defaults plus overrides resolved through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = read_positive(&lookup, ENV_SESSION_TTL_SECS)? {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(ms) = read_positive(&lookup, ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = read_positive(&lookup, ENV_EXPIRY_WARNING_SECS)? {
            config.expiry_warning = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn read_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<u64>() {
        Ok(0) => Err(ConfigError::NotPositive { name }),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(ConfigError::InvalidNumber {
            name,
            value: trimmed.to_string(),
        }),
    }
}

/// Configuration override errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { name: &'static str, value: String },
    NotPositive { name: &'static str },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { name, value } => {
                write!(f, "{name} must be a whole number, got `{value}`")
            }
            Self::NotPositive { name } => write!(f, "{name} must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, ENV_EXPIRY_WARNING_SECS, ENV_POLL_INTERVAL_MS,
        ENV_SESSION_TTL_SECS,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_use_one_hour_ttl() {
        let config = CoreConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(3_600));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.expiry_warning, Duration::from_secs(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_SESSION_TTL_SECS, "600"),
            (ENV_POLL_INTERVAL_MS, " 250 "),
            (ENV_EXPIRY_WARNING_SECS, ""),
        ]))
        .expect("valid overrides");

        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.expiry_warning, Duration::from_secs(300));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_SESSION_TTL_SECS, "0")]))
            .expect_err("zero ttl must fail");
        assert_eq!(
            err,
            ConfigError::NotPositive {
                name: ENV_SESSION_TTL_SECS
            }
        );

        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_POLL_INTERVAL_MS, "soon")]))
            .expect_err("garbage must fail");
        assert!(err.to_string().contains("soon"));
    }
}
