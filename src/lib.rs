//! squad-api: War Thunder squadron scraper
//!
//! Fetches a squadron's profile page (through headless Chrome or plain HTTP),
//! caches it for an hour, and decodes:
//! - the members table into player records
//! - the profile header stat block into labelled values

pub mod browser;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod pages;
pub mod roster;
pub mod server;
pub mod stats;

pub use cache::{is_fresh, squadron_key, CacheEntry, PageCache, PageStore};
pub use config::Config;
pub use error::FetchError;
pub use fetch::{squadron_url, HttpFetcher, PageFetcher};
pub use pages::{Markup, SquadronPages};
pub use roster::{decode_roster, PlayerRecord, Roster};
pub use stats::{coerce, decode_stats, StatBlock, StatLabel, StatValue};
