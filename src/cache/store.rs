use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{CacheKey, Freshness};
use crate::errors::DataError;

/// Time source for the cache. Swapped for a fake in tests so TTL behavior
/// can be exercised without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// A value returned by the cache, tagged with how it was obtained.
#[derive(Clone, Debug)]
pub struct Fetched<V> {
    pub value: V,
    pub freshness: Freshness,
}

/// Concurrent in-memory cache keyed by [`CacheKey`].
///
/// Entries carry the timestamp they were stored at; a read within `ttl`
/// returns the cached clone without touching the upstream. Past the TTL the
/// entry stays in the map and the next read re-fetches, falling back to the
/// expired value if the fetch fails.
pub struct CacheStore<V: Clone> {
    entries: DashMap<CacheKey, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>) -> bool {
        let age = (self.clock.now() - stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }

    /// Returns the cached value if it is within its TTL, otherwise runs
    /// `fetch` via [`refresh`](Self::refresh).
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<Fetched<V>, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataError>>,
    {
        // The map guard must not be held across the fetch await.
        let cached = self.entries.get(&key).map(|entry| {
            let fresh = self.is_fresh(entry.stored_at);
            (entry.value.clone(), fresh)
        });

        if let Some((value, true)) = cached {
            log::debug!("Cache hit for {}", key);
            return Ok(Fetched {
                value,
                freshness: Freshness::Hit,
            });
        }

        self.refresh(key, fetch).await
    }

    /// Runs `fetch` unconditionally and stores the result.
    ///
    /// On failure an existing (expired) entry is served instead, marked
    /// [`Freshness::Stale`]; with no entry to fall back on the error is
    /// propagated.
    pub async fn refresh<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Fetched<V>, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataError>>,
    {
        match fetch().await {
            Ok(value) => {
                self.entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        stored_at: self.clock.now(),
                    },
                );
                Ok(Fetched {
                    value,
                    freshness: Freshness::Refreshed,
                })
            }
            Err(e) => {
                let stale = self.entries.get(&key).map(|entry| entry.value.clone());
                match stale {
                    Some(value) => {
                        log::warn!("Refresh failed for {}, serving stale entry: {}", key, e);
                        Ok(Fetched {
                            value,
                            freshness: Freshness::Stale,
                        })
                    }
                    None => Err(e),
                }
            }
        }
    }
}
