//! Rendered page cache.
//!
//! Entries expire `ttl` after they were stored. Writes to the database never
//! touch the cache: a page stays stale until it expires or the cache is cleared.

use actix_web::web::Bytes;
use chrono::{Duration, NaiveDateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Source of the current time for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now().naive_utc())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone, Debug)]
struct CachedPage {
    body: Bytes,
    stored_at: NaiveDateTime,
}

pub struct PageCache {
    entries: DashMap<String, CachedPage>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PageCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored body if it is younger than the TTL. Expired entries are dropped.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = self.clock.now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| (entry.body.clone(), now - entry.stored_at < self.ttl));

        match hit {
            Some((body, true)) => Some(body),
            Some((_, false)) => {
                self.entries
                    .remove_if(key, |_, entry| now - entry.stored_at >= self.ttl);
                None
            }
            None => None,
        }
    }

    /// Stores `body` under `key` and drops every entry that has expired.
    pub fn put(&self, key: impl Into<String>, body: Bytes) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| now - entry.stored_at < self.ttl);
        self.entries.insert(
            key.into(),
            CachedPage {
                body,
                stored_at: now,
            },
        );
    }

    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        log::info!("PageCache::clear: dropped {} entries", count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Cache key for a page of a listing as seen by one viewer.
/// Pages embed the viewer's navigation, so guests and each user get their own copy.
pub fn page_key(route: &str, page: u64, viewer: Option<i32>) -> String {
    match viewer {
        Some(id) => format!("{}?page={}#user-{}", route, page, id),
        None => format!("{}?page={}#guest", route, page),
    }
}
