//! Runtime configuration resolved from environment variables.
//!
//! | Setting | Env var | Default |
//! |---------|---------|---------|
//! | home directory | `STOCKWATCH_HOME` | `$HOME/.stockwatch` |
//! | API key | `STOCKWATCH_ALPHAVANTAGE_API_KEY`, then `ALPHA_VANTAGE_API_KEY` | none; fetches fail with `API_KEY_MISSING` |
//! | base URL | `STOCKWATCH_ALPHAVANTAGE_BASE_URL` | `https://www.alphavantage.co/query` |
//! | request timeout | `STOCKWATCH_REQUEST_TIMEOUT_MS` | `10000` |
//! | request budget | `STOCKWATCH_RATE_LIMIT_REQUESTS` / `STOCKWATCH_RATE_LIMIT_WINDOW_SECS` | `100` / `3600` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::alphavantage::DEFAULT_BASE_URL;

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root directory for stockwatch data.
    pub home: PathBuf,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Per-request timeout, applied to the transport and to each chart fetch.
    pub request_timeout: Duration,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home: default_home(|name| env::var_os(name).map(|v| v.to_string_lossy().into_owned())),
            api_key: None,
            base_url: String::from(DEFAULT_BASE_URL),
            request_timeout: Duration::from_secs(10),
            rate_limit_requests: 100,
            rate_limit_window: Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve settings through `lookup`; unparsable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self {
            home: default_home(&lookup),
            ..Self::default()
        };
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            api_key: non_empty("STOCKWATCH_ALPHAVANTAGE_API_KEY")
                .or_else(|| non_empty("ALPHA_VANTAGE_API_KEY")),
            base_url: non_empty("STOCKWATCH_ALPHAVANTAGE_BASE_URL")
                .unwrap_or(defaults.base_url),
            request_timeout: parse_number(&lookup, "STOCKWATCH_REQUEST_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            rate_limit_requests: parse_number(&lookup, "STOCKWATCH_RATE_LIMIT_REQUESTS")
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.rate_limit_requests),
            rate_limit_window: parse_number(&lookup, "STOCKWATCH_RATE_LIMIT_WINDOW_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            home: defaults.home,
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Directory holding persisted snapshots.
    pub fn storage_dir(&self) -> PathBuf {
        self.home.join("storage")
    }

}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("home", &self.home)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .finish()
    }
}

fn default_home<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("STOCKWATCH_HOME").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    if let Some(home) = lookup("HOME").filter(|p| !p.is_empty()) {
        return PathBuf::from(home).join(".stockwatch");
    }

    PathBuf::from(".stockwatch")
}

fn parse_number<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|raw| raw.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[("HOME", "/home/trader")]));
        assert_eq!(config.home, PathBuf::from("/home/trader/.stockwatch"));
        assert_eq!(config.storage_dir(), PathBuf::from("/home/trader/.stockwatch/storage"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_limit_requests, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(3600));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("ALPHA_VANTAGE_API_KEY", "  ")]));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn prefixed_api_key_wins_over_legacy_name() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("ALPHA_VANTAGE_API_KEY", "legacy"),
            ("STOCKWATCH_ALPHAVANTAGE_API_KEY", "primary"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = AppConfig::from_lookup(lookup_from(&[("ALPHA_VANTAGE_API_KEY", "legacy")]));
        assert_eq!(config.api_key.as_deref(), Some("legacy"));
    }

    #[test]
    fn explicit_home_and_numbers_are_honoured() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STOCKWATCH_HOME", "/data/sw"),
            ("STOCKWATCH_REQUEST_TIMEOUT_MS", "2500"),
            ("STOCKWATCH_RATE_LIMIT_REQUESTS", "5"),
            ("STOCKWATCH_RATE_LIMIT_WINDOW_SECS", "60"),
        ]));
        assert_eq!(config.home, PathBuf::from("/data/sw"));
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.rate_limit_requests, 5);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STOCKWATCH_REQUEST_TIMEOUT_MS", "soon"),
            ("STOCKWATCH_RATE_LIMIT_REQUESTS", "0"),
        ]));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_limit_requests, 100);
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let config = AppConfig::from_lookup(lookup_from(&[("ALPHA_VANTAGE_API_KEY", "s3cret")]));
        assert!(!format!("{config:?}").contains("s3cret"));
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
    }
}
