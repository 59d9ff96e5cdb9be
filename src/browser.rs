//! Headless Chrome fetcher via chromiumoxide
//!
//! Passes the profile site's anti-bot interstitial by running a real browser
//! and waiting for the challenge page to hand over to the squadron page.

use crate::config::{Config, MAX_FETCH_TIMEOUT_SECS};
use crate::error::FetchError;
use crate::fetch::{is_challenge_page, squadron_url, PageFetcher};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::debug;

const CHALLENGE_POLL: Duration = Duration::from_millis(500);

/// Browser pool configuration
pub struct BrowserPool {
    browser: Browser,
    semaphore: Arc<Semaphore>,
    user_agent: String,
}

impl BrowserPool {
    /// Launch Chrome with at most `tabs` pages open at once
    pub async fn new(tabs: usize, user_agent: &str) -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--headless=new")
            .build()
            .map_err(|e| anyhow::anyhow!("Browser config error: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome. Is Chrome/Chromium installed?")?;

        // Spawn handler in background
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            semaphore: Arc::new(Semaphore::new(tabs.max(1))),
            user_agent: user_agent.to_string(),
        })
    }

    /// Open a blank tab once a permit is free
    pub async fn new_page(&self) -> Result<BrowserPage> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        let page = self.browser.new_page("about:blank").await?;

        page.execute(
            chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams::new(
                &self.user_agent,
            ),
        )
        .await?;

        Ok(BrowserPage {
            page,
            _permit: permit,
        })
    }
}

/// A browser tab holding one concurrency permit until dropped
pub struct BrowserPage {
    page: Page,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl BrowserPage {
    /// Load `url`, wait out any challenge until `deadline`, return the markup.
    async fn load(&self, url: &str, squadron: &str, deadline: Instant) -> Result<String, FetchError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FetchError::browser(squadron, e))?;

        loop {
            let html = self
                .page
                .content()
                .await
                .map_err(|e| FetchError::browser(squadron, e))?;

            if !is_challenge_page(&html) {
                let title = self.page.get_title().await.ok().flatten();
                if let Some(status) = title.as_deref().and_then(error_status) {
                    return Err(FetchError::Status {
                        squadron: squadron.to_string(),
                        status,
                    });
                }
                return Ok(html);
            }

            if Instant::now() + CHALLENGE_POLL >= deadline {
                return Err(FetchError::Challenge {
                    squadron: squadron.to_string(),
                });
            }
            debug!(squadron, "waiting for anti-bot challenge to clear");
            tokio::time::sleep(CHALLENGE_POLL).await;
        }
    }

    async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!(error = %e, "failed to close tab");
        }
    }
}

/// Fetches squadron pages through the headless browser pool.
pub struct BrowserFetcher {
    pool: BrowserPool,
    base_url: String,
    timeout: Duration,
}

impl BrowserFetcher {
    pub async fn launch(config: &Config) -> Result<Self> {
        let pool = BrowserPool::new(config.browser_tabs, &config.user_agent).await?;
        Ok(Self {
            pool,
            base_url: config.base_url.clone(),
            timeout: config.fetch_timeout,
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, squadron: &str) -> Result<String, FetchError> {
        let url = squadron_url(&self.base_url, squadron);
        let deadline = deadline_after(self.timeout);
        debug!(%url, "navigating to squadron page");

        let page = self
            .pool
            .new_page()
            .await
            .map_err(|e| FetchError::browser(squadron, e))?;

        let result = tokio::time::timeout_at(deadline, page.load(&url, squadron, deadline)).await;
        page.close().await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout {
                squadron: squadron.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

/// `now + timeout`, capped when the sum would overflow the clock.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(MAX_FETCH_TIMEOUT_SECS))
}

/// chromiumoxide doesn't expose the HTTP status, so error pages are
/// recognised by their title. Regular pages carry the site suffix; error
/// pages lead with the code or phrase, so squadron names containing either
/// are not mistaken for errors.
fn error_status(title: &str) -> Option<u16> {
    const SITE_SUFFIX: &str = "war thunder";
    const ERROR_TITLES: [(&str, u16); 10] = [
        ("404", 404),
        ("not found", 404),
        ("page not found", 404),
        ("403", 403),
        ("forbidden", 403),
        ("access denied", 403),
        ("500", 500),
        ("internal server error", 500),
        ("502", 502),
        ("bad gateway", 502),
    ];

    let t = title.trim().to_lowercase();
    if t.ends_with(SITE_SUFFIX) {
        return None;
    }
    ERROR_TITLES
        .iter()
        .find(|(prefix, _)| t.starts_with(prefix))
        .map(|(_, status)| *status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        assert_eq!(error_status("404 Not Found"), Some(404));
        assert_eq!(error_status("Page Not Found"), Some(404));
        assert_eq!(error_status("Access denied | warthunder.com"), Some(403));
        assert_eq!(error_status("502 Bad Gateway"), Some(502));
        assert_eq!(error_status("Band Of Brothers - War Thunder"), None);
        assert_eq!(error_status("Top500 - War Thunder"), None);
    }

    #[test]
    fn test_error_phrases_in_squadron_names() {
        assert_eq!(error_status("Squadron Not Found Legion - War Thunder"), None);
        assert_eq!(error_status("Forbidden Wings - War Thunder"), None);
        assert_eq!(error_status("Access Denied Aces - War Thunder"), None);
        assert_eq!(error_status("The Forbidden Few"), None);
    }

    #[test]
    fn test_deadline_after_never_overflows() {
        let before = Instant::now();
        let capped = deadline_after(Duration::from_secs(u64::MAX));
        assert!(capped >= before + Duration::from_secs(MAX_FETCH_TIMEOUT_SECS));

        let normal = deadline_after(Duration::from_secs(30));
        assert!(normal >= before + Duration::from_secs(30));
        assert!(normal < before + Duration::from_secs(31));
    }
}
