use async_trait::async_trait;
use moka::future::Cache;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;
use wormhole_core::{CacheError, Purger, UrlCache};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;

/// An in-process resolve cache backed by Moka.
///
/// Entries are keyed by row id, so every spelling of a short code shares one
/// slot. A `None` value records that the id had no active row.
///
/// A fetch that overlaps a [`UrlCache::del`] does not leave its result
/// behind: the invalidation generation is compared once the fetch is done.
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    cache: Cache<u64, Option<String>>,
    generation: Arc<AtomicU64>,
}

impl MokaUrlCache {
    /// Creates a cache holding at most 10,000 entries, with no expiry.
    pub fn new() -> Self {
        Self::from_cache(Cache::builder().max_capacity(10_000).build())
    }

    /// Creates a cache whose entries expire `ttl` after insertion.
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self::from_cache(
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        )
    }

    fn from_cache(cache: Cache<u64, Option<String>>) -> Self {
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn get_url(&self, id: u64) -> Result<Option<Option<String>>> {
        let hit = self.cache.get(&id).await;
        trace!(id, hit = hit.is_some(), "moka lookup");
        Ok(hit)
    }

    async fn set_url(&self, id: u64, url: Option<String>) -> Result<()> {
        self.cache.insert(id, url).await;
        trace!(id, "cached resolution");
        Ok(())
    }

    async fn del(&self, id: u64) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&id).await;
        debug!(id, "dropped cached resolution");
        Ok(())
    }

    async fn get_or_compute<F, Fut>(&self, id: u64, fetch: F) -> Result<Option<String>>
    where
        F: FnOnce(u64) -> Fut + Send,
        Fut: Future<Output = Result<Option<String>>> + Send,
    {
        let generation = self.generation.load(Ordering::SeqCst);

        // try_get_with coalesces concurrent misses for one id into a single fetch
        let url = self
            .cache
            .try_get_with(id, async move {
                trace!(id, "cache miss, fetching");
                fetch(id).await
            })
            .await
            .map_err(|e| e.as_ref().clone())?;

        // an invalidation ran while we were fetching; what we stored may predate it
        if self.generation.load(Ordering::SeqCst) != generation {
            self.cache.invalidate(&id).await;
            trace!(id, "dropped resolution fetched across an invalidation");
        }

        Ok(url)
    }
}

#[async_trait]
impl Purger for MokaUrlCache {
    async fn purge(&self, id: u64, _codes: &BTreeSet<String>) -> Result<()> {
        self.del(id).await
    }
}

/// Configuration for creating a MokaUrlCache with custom settings.
#[derive(Debug, TypedBuilder, Default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Time-to-live for cache entries.
    #[builder(default, setter(strip_option))]
    ttl: Option<Duration>,
    /// Time-to-live for cached misses. Falls back to `ttl`.
    #[builder(default, setter(strip_option))]
    miss_ttl: Option<Duration>,
}

/// Gives cached misses their own lifetime.
struct MissExpiry {
    hit: Option<Duration>,
    miss: Option<Duration>,
}

impl moka::Expiry<u64, Option<String>> for MissExpiry {
    fn expire_after_create(
        &self,
        _key: &u64,
        value: &Option<String>,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        match value {
            Some(_) => self.hit,
            None => self.miss.or(self.hit),
        }
    }
}

impl From<CacheConfig> for MokaUrlCache {
    fn from(config: CacheConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        if config.ttl.is_some() || config.miss_ttl.is_some() {
            builder = builder.expire_after(MissExpiry {
                hit: config.ttl,
                miss: config.miss_ttl,
            });
        }

        MokaUrlCache::from_cache(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn set_get_and_del() {
        let cache = MokaUrlCache::new();

        assert_eq!(cache.get_url(7).await.unwrap(), None);

        cache
            .set_url(7, Some("http://example.org/".to_string()))
            .await
            .unwrap();
        assert_eq!(
            cache.get_url(7).await.unwrap(),
            Some(Some("http://example.org/".to_string()))
        );

        cache.del(7).await.unwrap();
        assert_eq!(cache.get_url(7).await.unwrap(), None);

        // deleting a missing key is fine
        cache.del(7).await.unwrap();
    }

    #[tokio::test]
    async fn misses_are_cached_too() {
        let cache = MokaUrlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let url = cache
                .get_or_compute(9, move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert_eq!(url, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get_url(9).await.unwrap(), Some(None));
    }

    #[tokio::test]
    async fn purge_drops_the_id() {
        let cache = MokaUrlCache::new();
        cache.set_url(1, Some("http://a/".into())).await.unwrap();

        let codes = BTreeSet::from(["3".to_string(), "_z".to_string()]);
        cache.purge(1, &codes).await.unwrap();

        assert_eq!(cache.get_url(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ttl_expires_entries() {
        let cache = MokaUrlCache::with_ttl(100, Duration::from_millis(50));
        cache.set_url(1, Some("http://a/".into())).await.unwrap();
        assert!(cache.get_url(1).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get_url(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn misses_expire_before_hits() {
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .max_capacity(100)
            .ttl(Duration::from_secs(60))
            .miss_ttl(Duration::from_millis(50))
            .build()
            .into();

        cache.set_url(1, Some("http://a/".into())).await.unwrap();
        cache.set_url(2, None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get_url(1).await.unwrap().is_some());
        assert!(cache.get_url(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn single_flight_prevents_concurrent_fetch() {
        let cache = MokaUrlCache::new();
        let fetch_count = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..10 {
            let cache = cache.clone();
            let count = fetch_count.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(42, |_| async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(Some("http://example.org/".to_string()))
                    })
                    .await
            }));
        }

        for handle in handles {
            let url = handle.await.unwrap().unwrap();
            assert_eq!(url.as_deref(), Some("http://example.org/"));
        }

        assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let cache = MokaUrlCache::new();

        let err = cache
            .get_or_compute(3, |_| async {
                Err(CacheError::Timeout("simulated timeout".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Timeout(_)));

        assert_eq!(cache.get_url(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetch_overlapping_a_del_is_not_kept() {
        let cache = MokaUrlCache::new();
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let fetching = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(4, move |_| async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok(Some("http://example.org/stale".to_string()))
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        cache.del(4).await.unwrap();
        release_tx.send(()).unwrap();

        let url = fetching.await.unwrap().unwrap();
        assert_eq!(url.as_deref(), Some("http://example.org/stale"));
        assert_eq!(cache.get_url(4).await.unwrap(), None);
    }
}
