//! Fetch options shared by every subcommand

use crate::browser::BrowserFetcher;
use crate::cache::PageCache;
use crate::config::{
    Config, CLANINFO_BASE_URL, DEFAULT_BROWSER_TABS, FETCH_TIMEOUT_SECS, MAX_FETCH_TIMEOUT_SECS,
};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::pages::SquadronPages;
use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::{Args, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    /// Headless Chrome (passes the anti-bot interstitial)
    Browser,
    /// Plain HTTP client (fails when challenged)
    Http,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Disable caching of squadron pages
    #[arg(long)]
    pub no_cache: bool,

    /// How squadron pages are retrieved
    #[arg(long, value_enum, default_value = "browser")]
    pub fetcher: FetcherKind,

    /// Browser tabs used concurrently (1-16)
    #[arg(long, default_value_t = DEFAULT_BROWSER_TABS, value_parser = clap::value_parser!(u8).range(1..=16).map(usize::from))]
    pub tabs: usize,

    /// Timeout per page fetch in seconds (1-300)
    #[arg(long, default_value_t = FETCH_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_FETCH_TIMEOUT_SECS))]
    pub timeout: u64,

    /// Squadron profile base URL
    #[arg(long, env = "SQUAD_API_BASE_URL", default_value = CLANINFO_BASE_URL, hide = true)]
    pub base_url: String,
}

impl FetchArgs {
    pub fn config(&self) -> Config {
        Config::new()
            .with_caching(!self.no_cache)
            .with_browser_tabs(self.tabs)
            .with_fetch_timeout(Duration::from_secs(self.timeout))
            .with_base_url(self.base_url.clone())
    }

    /// Build the configured fetcher and wrap it with a fresh page cache.
    pub async fn build_pages(&self) -> Result<SquadronPages> {
        let config = self.config();

        let fetcher: Arc<dyn PageFetcher> = match self.fetcher {
            FetcherKind::Browser => Arc::new(BrowserFetcher::launch(&config).await?),
            FetcherKind::Http => {
                Arc::new(HttpFetcher::new(&config).context("Failed to build HTTP client")?)
            }
        };
        info!(fetcher = ?self.fetcher, "page fetcher ready");

        Ok(SquadronPages::new(fetcher, Arc::new(PageCache::new()), &config))
    }
}
