use async_trait::async_trait;
use tracing::{trace, warn};
use wormhole_core::{
    CacheError, ReadRepository, ShortcodeEntry, StorageError, UrlCache, UrlHash,
};

/// Type alias for repository results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only repository decorator that caches `resolve`.
///
/// Concurrent misses for one id are coalesced when the cache supports it.
/// A cache that fails on lookup is bypassed rather than failing the read.
/// The other reads pass straight through: `is_deleted` must reflect a
/// delete immediately and scans are too large to cache.
#[derive(Debug, Clone)]
pub struct CachedRepository<R, C> {
    inner: R,
    cache: C,
}

impl<R: ReadRepository, C: UrlCache> CachedRepository<R, C> {
    pub fn new(inner: R, cache: C) -> Self {
        Self { inner, cache }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Drops the cached resolution for `id`.
    pub async fn invalidate(&self, id: u64) -> Result<()> {
        trace!(id, "invalidating cache entry");
        Ok(self.cache.del(id).await?)
    }
}

#[async_trait]
impl<R: ReadRepository, C: UrlCache> ReadRepository for CachedRepository<R, C> {
    async fn find_by_hash(&self, hash: &UrlHash) -> Result<Option<ShortcodeEntry>> {
        self.inner.find_by_hash(hash).await
    }

    async fn resolve(&self, id: u64) -> Result<Option<String>> {
        let cached = self
            .cache
            .get_or_compute(id, |id| async move {
                trace!(id, "cache miss, resolving from inner repository");
                self.inner
                    .resolve(id)
                    .await
                    .map_err(|e| CacheError::Operation(e.to_string()))
            })
            .await;

        match cached {
            Ok(url) => Ok(url),
            Err(err) => {
                warn!(id, error = %err, "cached resolve failed, reading through");
                self.inner.resolve(id).await
            }
        }
    }

    async fn is_deleted(&self, id: u64) -> Result<bool> {
        self.inner.is_deleted(id).await
    }

    async fn scan_active(&self, after_id: u64, limit: usize) -> Result<Vec<ShortcodeEntry>> {
        self.inner.scan_active(after_id, limit).await
    }
}
