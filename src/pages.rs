//! Cached page retrieval
//!
//! [`SquadronPages`] is the only place that decides between serving a cached
//! page, fetching a fresh one, or bypassing the cache entirely. A failed fetch
//! is not an error here: it becomes [`Markup::Empty`] and the decoders turn
//! that into empty results.

use crate::cache::{is_fresh, squadron_key, PageStore};
use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::roster::{decode_roster, Roster};
use crate::stats::{decode_stats, StatBlock};
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Markup for a squadron, or nothing when the page could not be fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Markup {
    Page(String),
    #[default]
    Empty,
}

impl Markup {
    pub fn as_str(&self) -> &str {
        match self {
            Markup::Page(body) => body,
            Markup::Empty => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Markup::Empty)
    }
}

pub struct SquadronPages {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PageStore>,
    caching_enabled: bool,
    freshness_window: TimeDelta,
}

impl SquadronPages {
    pub fn new(fetcher: Arc<dyn PageFetcher>, store: Arc<dyn PageStore>, config: &Config) -> Self {
        Self {
            fetcher,
            store,
            caching_enabled: config.caching_enabled,
            freshness_window: config.freshness_window,
        }
    }

    pub fn caching_enabled(&self) -> bool {
        self.caching_enabled
    }

    /// Markup for `squadron`, from the cache when fresh, otherwise fetched.
    ///
    /// With caching disabled the store is neither read nor written. The fetch
    /// runs as its own task, so a caller that goes away does not stop it from
    /// completing and populating the cache.
    pub async fn get_markup(&self, squadron: &str) -> Markup {
        let key = squadron_key(squadron);

        if self.caching_enabled {
            if let Some(entry) = self.store.get(&key) {
                if is_fresh(&entry, Utc::now(), self.freshness_window) {
                    debug!(squadron, "using cached page");
                    return Markup::Page(entry.body);
                }
                debug!(squadron, fetched_at = %entry.fetched_at, "cached page is stale");
            }
        }

        info!(squadron, "fetching squadron page");
        let fetcher = Arc::clone(&self.fetcher);
        let store = self.caching_enabled.then(|| Arc::clone(&self.store));
        let name = squadron.to_string();

        let task = tokio::spawn(async move {
            let body = fetcher.fetch(&name).await?;
            if let Some(store) = store {
                store.put(&key, body.clone(), Utc::now());
                info!(squadron = %name, bytes = body.len(), "fetched and cached squadron page");
            }
            Ok::<_, FetchError>(body)
        });

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, "fetch task failed to join");
                Err(FetchError::Aborted {
                    squadron: squadron.to_string(),
                })
            }
        };

        match outcome {
            Ok(body) => Markup::Page(body),
            Err(e) => {
                warn!(squadron = e.squadron(), error = %e, "failed to fetch squadron page");
                Markup::Empty
            }
        }
    }

    /// Player roster of `squadron`; empty when the page is unavailable.
    pub async fn roster(&self, squadron: &str) -> Roster {
        match self.get_markup(squadron).await {
            Markup::Page(body) => decode_roster(&body),
            Markup::Empty => Roster::default(),
        }
    }

    /// Stat group `group` of `squadron`; empty when the page is unavailable.
    pub async fn stats(&self, squadron: &str, group: i64) -> StatBlock {
        match self.get_markup(squadron).await {
            Markup::Page(body) => decode_stats(&body, group),
            Markup::Empty => StatBlock::default(),
        }
    }
}
