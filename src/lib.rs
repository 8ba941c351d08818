pub mod db;
use db::{models, schema};

pub mod board;
pub mod coc;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod subsystems;
pub mod table;
pub mod tasks;

use std::env;
use std::str::FromStr;
use error::{TrackerError, Result};

/// Convenience function for getting a type whose underlying
/// id data type is a snowflake (e.g a channel id).
pub fn env_snowflake<T: From<u64>> (key: &str) -> Result<T> {
    Ok(T::from(
        env::var(key)
            .map_err(|e|
                     TrackerError::EnvVarError {
                         key: key.to_string(),
                         source: e
                     })?
        .parse::<u64>()
            .map_err(|e|
                     TrackerError::SnowflakeParseError {
                         snowflake: key.to_string(),
                         source: e
                     })?
    ))
}

/// Like [`env_snowflake`], but an unset variable is `None`.
pub fn env_snowflake_opt<T: From<u64>> (key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(_) => env_snowflake(key).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(TrackerError::EnvVarError { key: key.to_string(), source: e }),
    }
}

pub fn env_str(key: &str) -> Result<String> {
    env::var(key)
        .map_err(|e|
                 TrackerError::EnvVarError {
                     key: key.to_string(),
                     source: e
                 })
}

/// Reads and parses `key`, falling back to `default` when it is unset.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(value) => value.parse::<T>()
            .map_err(|_| TrackerError::ConfigError { key: key.to_string(), value }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(TrackerError::EnvVarError { key: key.to_string(), source: e }),
    }
}

/// Compact "time since" string, e.g. `3d 4h`, `2h 5m`, `12m`.
pub fn ago(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let d = seconds / 86_400;
    let h = (seconds / 3600) % 24;
    let m = (seconds / 60) % 60;
    match (d, h) {
        (0, 0) => format!("{}m", m),
        (0, _) => format!("{}h {}m", h, m),
        _ => format!("{}d {}h", d, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ago_picks_the_two_largest_units() {
        assert_eq!(ago(0), "0m");
        assert_eq!(ago(59), "0m");
        assert_eq!(ago(12 * 60), "12m");
        assert_eq!(ago(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(ago(3 * 86_400 + 4 * 3600 + 59), "3d 4h");
        assert_eq!(ago(-30), "0m");
    }

    #[test]
    fn env_or_defaults_and_parses() {
        env::remove_var("TRACKER_TEST_UNSET");
        assert_eq!(env_or("TRACKER_TEST_UNSET", 60u64).unwrap(), 60);

        env::set_var("TRACKER_TEST_SECS", "90");
        assert_eq!(env_or("TRACKER_TEST_SECS", 60u64).unwrap(), 90);

        env::set_var("TRACKER_TEST_BAD", "ninety");
        assert!(matches!(
            env_or("TRACKER_TEST_BAD", 60u64),
            Err(TrackerError::ConfigError { .. })
        ));
    }

    #[test]
    fn optional_snowflakes() {
        env::remove_var("TRACKER_TEST_CHANNEL");
        let none: Option<u64> = env_snowflake_opt("TRACKER_TEST_CHANNEL").unwrap();
        assert!(none.is_none());

        env::set_var("TRACKER_TEST_CHANNEL", "663683345108172830");
        let some: Option<u64> = env_snowflake_opt("TRACKER_TEST_CHANNEL").unwrap();
        assert_eq!(some, Some(663683345108172830));
    }
}
