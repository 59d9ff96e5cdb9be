//! In-memory page cache keyed by lower-cased squadron name
//!
//! Entries are overwritten on refresh and never evicted; a stale entry simply
//! stops being served until the next successful fetch replaces it.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A fetched page body and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

/// Cache index for a squadron name as supplied by the caller.
pub fn squadron_key(name: &str) -> String {
    name.to_lowercase()
}

/// An entry is served while `now - fetched_at < window`.
pub fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>, window: TimeDelta) -> bool {
    now.signed_duration_since(entry.fetched_at) < window
}

/// Storage seam for the orchestrator. Implementations must tolerate
/// concurrent readers and writers; the last `put` for a key wins.
pub trait PageStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn put(&self, key: &str, body: String, fetched_at: DateTime<Utc>);
}

#[derive(Debug, Default)]
pub struct PageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PageStore for PageCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, body: String, fetched_at: DateTime<Utc>) {
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry { body, fetched_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry_at(fetched_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            body: "<html></html>".to_string(),
            fetched_at,
        }
    }

    #[test]
    fn test_squadron_key_lowercases_only() {
        assert_eq!(squadron_key("Band Of Brothers"), "band of brothers");
        assert_eq!(squadron_key("  ABC  "), "  abc  ");
    }

    #[test]
    fn test_is_fresh_boundary() {
        let t0 = Utc::now();
        let window = TimeDelta::seconds(3600);
        let entry = entry_at(t0);

        assert!(is_fresh(&entry, t0, window));
        assert!(is_fresh(&entry, t0 + TimeDelta::seconds(3599), window));
        assert!(is_fresh(
            &entry,
            t0 + TimeDelta::milliseconds(3_599_999),
            window
        ));
        assert!(!is_fresh(&entry, t0 + TimeDelta::seconds(3600), window));
        assert!(!is_fresh(&entry, t0 + TimeDelta::days(2), window));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = PageCache::new();
        let t0 = Utc::now();
        cache.put("abc", "first".to_string(), t0);
        cache.put("abc", "second".to_string(), t0 + TimeDelta::seconds(5));

        let entry = cache.get("abc").unwrap();
        assert_eq!(entry.body, "second");
        assert_eq!(entry.fetched_at, t0 + TimeDelta::seconds(5));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_concurrent_writers_same_key() {
        let cache = Arc::new(PageCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.put("abc", format!("body-{}", i), Utc::now());
                        let _ = cache.get("abc");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let body = cache.get("abc").unwrap().body;
        assert!(body.starts_with("body-"));
        assert_eq!(cache.len(), 1);
    }
}
