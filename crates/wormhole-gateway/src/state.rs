use std::sync::Arc;
use std::time::Duration;

use wormhole_cache::{MokaUrlCache, NoopPurger};
use wormhole_core::{IdCodec, Repository, ShortCode, ShortUrlTemplate};
use wormhole_redirector::{CachedRepository, Redirector, RedirectorService};
use wormhole_shortener::{ConfigLoadError, Shortener, ShortenerConfig, ShortenerService};

/// How long a resolved URL stays in the in-process cache.
pub const CACHE_TTL_VALID: Duration = Duration::from_secs(2_592_000);
/// How long an unknown code stays in the in-process cache.
pub const CACHE_TTL_INVALID: Duration = Duration::from_secs(900);
const CACHE_CAPACITY: u64 = 100_000;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    redirector: Arc<dyn Redirector>,
    short_urls: ShortUrlTemplate,
}

impl AppState {
    pub fn new(
        shortener: Arc<dyn Shortener>,
        redirector: Arc<dyn Redirector>,
        short_urls: ShortUrlTemplate,
    ) -> Self {
        Self {
            shortener,
            redirector,
            short_urls,
        }
    }

    /// Wires the shortener and a cached redirector over one store.
    ///
    /// Both sides share the codec. The shortener invalidates the resolve
    /// cache before a create, delete or restore returns, so the next
    /// redirect already sees the change.
    pub fn from_config<R>(repository: R, config: &ShortenerConfig) -> Result<Self, ConfigLoadError>
    where
        R: Repository + Clone,
    {
        let codec = Arc::new(IdCodec::new(config.codec.clone())?);
        let cache: MokaUrlCache = MokaUrlCache::builder()
            .max_capacity(CACHE_CAPACITY)
            .ttl(CACHE_TTL_VALID)
            .miss_ttl(CACHE_TTL_INVALID)
            .build()
            .into();

        let shortener = ShortenerService::new(
            Arc::new(repository.clone()),
            Arc::clone(&codec),
            config,
            Arc::new(NoopPurger),
        )?
        .with_local_cache(Arc::new(cache.clone()));
        let redirector = RedirectorService::new(
            Arc::new(CachedRepository::new(repository, cache)),
            codec,
        );

        Ok(Self::new(
            Arc::new(shortener),
            Arc::new(redirector),
            config.short_url_template(),
        ))
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }

    pub fn short_url(&self, code: &ShortCode) -> String {
        self.short_urls.make_url(code)
    }
}
