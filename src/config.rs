use std::env;
use std::time::Duration;

use dotenv::dotenv;

use crate::detect::DetectorConfig;
use crate::models::Platform;

pub const DEFAULT_DB_PATH: &str = "leetcommit.db";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Process configuration, read from the environment (and `.env` in the project root).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub api_url: String,
    pub settle_override: Option<Duration>,
    pub debounce_override: Option<Duration>,
    pub timeout_override: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            db_path: env::var("LEETCOMMIT_DB").unwrap_or_else(|_| String::from(DEFAULT_DB_PATH)),
            api_url: env::var("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| String::from(DEFAULT_API_URL)),
            settle_override: getenv_millis("LEETCOMMIT_SETTLE_MS"),
            debounce_override: getenv_millis("LEETCOMMIT_DEBOUNCE_MS"),
            timeout_override: getenv_millis("LEETCOMMIT_TIMEOUT_MS"),
        }
    }

    /// Platform timings with any environment overrides applied.
    pub fn detector(&self, platform: Platform) -> DetectorConfig {
        let defaults = DetectorConfig::for_platform(platform);
        DetectorConfig {
            settle_delay: self.settle_override.unwrap_or(defaults.settle_delay),
            debounce: self.debounce_override.unwrap_or(defaults.debounce),
            timeout: self.timeout_override.unwrap_or(defaults.timeout),
        }
    }
}

/// Reads a millisecond duration, ignoring (with a warning) values that don't parse.
fn getenv_millis(key: &str) -> Option<Duration> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(err) => {
            log::warn!("[config] Ignoring ${key}={raw}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_what_is_set() {
        let config = Config {
            db_path: String::from(DEFAULT_DB_PATH),
            api_url: String::from(DEFAULT_API_URL),
            settle_override: None,
            debounce_override: Some(Duration::from_millis(250)),
            timeout_override: None,
        };

        let detector = config.detector(Platform::NeetCode);
        let defaults = DetectorConfig::for_platform(Platform::NeetCode);
        assert_eq!(detector.settle_delay, defaults.settle_delay);
        assert_eq!(detector.debounce, Duration::from_millis(250));
        assert_eq!(detector.timeout, defaults.timeout);
    }
}
