use crate::error::CacheError;
use async_trait::async_trait;
use std::future::Future;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A cache of resolved URLs, keyed by row id.
///
/// `Some(None)` is a cached miss: the id has no active row. Keying by id
/// rather than by short code means every spelling of a code shares one entry.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached resolution for `id`.
    ///
    /// Returns `Ok(None)` if the id is not in the cache.
    async fn get_url(&self, id: u64) -> Result<Option<Option<String>>>;

    /// Store the resolution for `id`.
    async fn set_url(&self, id: u64, url: Option<String>) -> Result<()>;

    /// Remove the entry for `id`. It is not an error if the key does not exist.
    async fn del(&self, id: u64) -> Result<()>;

    /// Get the resolution for `id`, computing and caching it if not present.
    async fn get_or_compute<F, Fut>(&self, id: u64, fetch: F) -> Result<Option<String>>
    where
        F: FnOnce(u64) -> Fut + Send,
        Fut: Future<Output = Result<Option<String>>> + Send,
    {
        match self.get_url(id).await? {
            Some(url) => Ok(url),
            None => {
                let url = fetch(id).await?;
                self.set_url(id, url.clone()).await?;
                Ok(url)
            }
        }
    }
}
