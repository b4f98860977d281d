//! Environment-driven configuration.
//!
//! | Variable                | Default                 |
//! |-------------------------|-------------------------|
//! | `TASKSYNC_LOCAL_URL`    | `sqlite::memory:`       |
//! | `TASKSYNC_REMOTE_URL`   | unset: in-memory remote |
//! | `TASKSYNC_START_ONLINE` | `true`                  |
//! | `TASKSYNC_UTC_OFFSET`   | the machine's offset    |

use chrono::{FixedOffset, Local};
use thiserror::Error;

pub const LOCAL_URL_VAR: &str = "TASKSYNC_LOCAL_URL";
pub const REMOTE_URL_VAR: &str = "TASKSYNC_REMOTE_URL";
pub const START_ONLINE_VAR: &str = "TASKSYNC_START_ONLINE";
pub const UTC_OFFSET_VAR: &str = "TASKSYNC_UTC_OFFSET";

pub const DEFAULT_LOCAL_URL: &str = "sqlite::memory:";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No {0} store configured")]
    MissingStore(&'static str),

    #[error("Invalid UTC offset '{0}': expected +HH:MM, -HH:MM or Z")]
    InvalidOffset(String),

    #[error("Invalid value '{value}' for {var}: expected true or false")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSyncConfig {
    pub local_url: String,
    pub remote_url: Option<String>,
    pub start_online: bool,
    pub utc_offset: FixedOffset,
}

impl Default for TaskSyncConfig {
    fn default() -> Self {
        Self {
            local_url: DEFAULT_LOCAL_URL.to_string(),
            remote_url: None,
            start_online: true,
            utc_offset: *Local::now().offset(),
        }
    }
}

impl TaskSyncConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(LOCAL_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.local_url = url;
        }
        config.remote_url = lookup(REMOTE_URL_VAR).filter(|v| !v.trim().is_empty());
        if let Some(value) = lookup(START_ONLINE_VAR) {
            config.start_online = parse_flag(START_ONLINE_VAR, &value)?;
        }
        if let Some(value) = lookup(UTC_OFFSET_VAR) {
            config.utc_offset = parse_offset(&value)?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}

/// Parse `Z`, `+HH:MM` or `-HH:MM`.
pub fn parse_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidOffset(value.to_string());
    let raw = value.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
