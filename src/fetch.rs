//! Squadron page retrieval
//!
//! The profile site sits behind an anti-bot interstitial that blocks naive
//! clients, so there are two fetchers behind one trait: a headless browser
//! (see [`crate::browser`]) and a plain HTTP client that at least recognises
//! when it has been challenged.

use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// Retrieves the raw markup of a squadron's profile page. No caching, no retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, squadron: &str) -> Result<String, FetchError>;
}

/// Profile URL for a squadron: whitespace-separated words joined with `%20`.
pub fn squadron_url(base_url: &str, squadron: &str) -> String {
    let encoded = squadron.split_whitespace().collect::<Vec<_>>().join("%20");
    format!("{}{}", base_url, encoded)
}

/// Titles served by the interstitial instead of the real page
const CHALLENGE_TITLES: [&str; 3] = ["just a moment", "attention required", "please wait"];

/// Markers only present on challenge pages (regular pages also load
/// `challenge-platform` scripts, so that path is not a signal on its own).
const CHALLENGE_MARKERS: [&str; 2] = ["cf_chl_opt", "id=\"challenge-form\""];

/// Whether `html` is an anti-automation interstitial rather than a profile page.
pub fn is_challenge_page(html: &str) -> bool {
    if CHALLENGE_MARKERS.iter().any(|m| html.contains(m)) {
        return true;
    }
    page_title(html)
        .map(|t| {
            let t = t.to_lowercase();
            CHALLENGE_TITLES.iter().any(|c| t.starts_with(c))
        })
        .unwrap_or(false)
}

fn page_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// reqwest-backed fetcher sending desktop-browser headers.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.fetch_timeout,
        })
    }

    fn transport_error(&self, squadron: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                squadron: squadron.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                squadron: squadron.to_string(),
                source: err,
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, squadron: &str) -> Result<String, FetchError> {
        let url = squadron_url(&self.base_url, squadron);
        debug!(%url, "GET squadron page");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(squadron, e))?;

        let status = resp.status();
        let mitigated = resp
            .headers()
            .get("cf-mitigated")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("challenge"));
        if mitigated {
            return Err(FetchError::Challenge {
                squadron: squadron.to_string(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if is_challenge_page(&body) {
                return Err(FetchError::Challenge {
                    squadron: squadron.to_string(),
                });
            }
            return Err(FetchError::Status {
                squadron: squadron.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(squadron, e))?;
        if is_challenge_page(&body) {
            return Err(FetchError::Challenge {
                squadron: squadron.to_string(),
            });
        }

        Ok(body)
    }
}
