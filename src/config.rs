//! Runtime configuration and fixed constants

use chrono::TimeDelta;
use std::time::Duration;

/// Version reported by `/version` and the welcome page
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Squadron profile pages live under this path; the name is appended.
pub const CLANINFO_BASE_URL: &str = "https://warthunder.com/en/community/claninfo/";

/// Maximum age of a cached page that is still served.
pub const FRESHNESS_WINDOW_SECS: i64 = 3600;

/// Bounded timeout for one page retrieval.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Upper bound accepted for `--timeout`.
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

/// The second `ul` in the stat header holds the squadron totals.
pub const DEFAULT_STAT_GROUP: i64 = 1;

/// Default browser tab count for the headless fetcher
pub const DEFAULT_BROWSER_TABS: usize = 4;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Settings shared by the fetchers and the page orchestrator.
///
/// Built once at startup; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub caching_enabled: bool,
    pub freshness_window: TimeDelta,
    pub fetch_timeout: Duration,
    pub base_url: String,
    pub user_agent: String,
    pub browser_tabs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            freshness_window: TimeDelta::seconds(FRESHNESS_WINDOW_SECS),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            base_url: CLANINFO_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_tabs: DEFAULT_BROWSER_TABS,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    pub fn with_freshness_window(mut self, window: TimeDelta) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Override the profile page location (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_browser_tabs(mut self, tabs: usize) -> Self {
        self.browser_tabs = tabs.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.caching_enabled);
        assert_eq!(config.freshness_window, TimeDelta::seconds(3600));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.base_url, CLANINFO_BASE_URL);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_caching(false)
            .with_base_url("http://127.0.0.1:9999/claninfo/")
            .with_fetch_timeout(Duration::from_secs(5))
            .with_browser_tabs(0);

        assert!(!config.caching_enabled);
        assert_eq!(config.base_url, "http://127.0.0.1:9999/claninfo/");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.browser_tabs, 1);
    }
}
