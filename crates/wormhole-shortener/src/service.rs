use crate::config::ShortenerConfig;
use crate::error::{ConfigLoadError, Result, ShortenerError, ValidationError};
use crate::gate::{FixedWindowGate, Gatekeeper, OpenGate, Requester};
use crate::normalize::Normalizer;
use crate::shortener::{Shortened, Shortener};
use crate::validate::ValidationPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, trace};
use wormhole_cache::PurgeNotifier;
use wormhole_core::{Acquired, IdCodec, Purger, Repository};

/// The write side of the shortener.
///
/// Validates and normalizes incoming URLs, runs admission checks, maps the
/// URL to a row id through the repository and renders the id with the codec.
/// Every state change purges the affected short codes: the local resolve
/// cache before the call returns, any remote caches in the background.
pub struct ShortenerService<R> {
    repository: Arc<R>,
    codec: Arc<IdCodec>,
    normalizer: Normalizer,
    policy: ValidationPolicy,
    gate: Arc<dyn Gatekeeper>,
    notifier: PurgeNotifier,
    url_size_limit: usize,
    read_only: bool,
}

impl<R: Repository> ShortenerService<R> {
    /// Creates a service sharing `repository` and `codec` with other components.
    pub fn new(
        repository: Arc<R>,
        codec: Arc<IdCodec>,
        config: &ShortenerConfig,
        purger: Arc<dyn Purger>,
    ) -> std::result::Result<Self, ConfigLoadError> {
        let gate: Arc<dyn Gatekeeper> = match config.rate_limit {
            Some(settings) => Arc::new(FixedWindowGate::new(settings)),
            None => Arc::new(OpenGate),
        };

        Ok(Self {
            notifier: PurgeNotifier::new(Arc::clone(&codec), purger),
            repository,
            codec,
            normalizer: Normalizer::from_config(config),
            policy: ValidationPolicy::from_config(config)?,
            gate,
            url_size_limit: config.url_size_limit,
            read_only: config.read_only,
        })
    }

    /// Creates a service with its own codec built from `config.codec`.
    pub fn from_config(
        repository: R,
        config: &ShortenerConfig,
        purger: Arc<dyn Purger>,
    ) -> std::result::Result<Self, ConfigLoadError> {
        let codec = IdCodec::new(config.codec.clone())?;
        Self::new(Arc::new(repository), Arc::new(codec), config, purger)
    }

    /// Invalidates `cache` before a create, delete or restore returns.
    pub fn with_local_cache(mut self, cache: Arc<dyn Purger>) -> Self {
        self.notifier = self.notifier.with_local(cache);
        self
    }

    /// Replaces the admission checks derived from the config.
    pub fn with_gate(mut self, gate: Arc<dyn Gatekeeper>) -> Self {
        self.gate = gate;
        self
    }

    pub fn codec(&self) -> &Arc<IdCodec> {
        &self.codec
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn shortened(&self, id: u64) -> Shortened {
        Shortened {
            id,
            code: self.codec.encode(id),
            alt_code: self.codec.encode_alt(id),
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(ShortenerError::ReadOnly);
        }
        Ok(())
    }

    async fn set_deleted(&self, code: &str, deleted: bool) -> Result<()> {
        self.ensure_writable()?;
        let id = self.codec.decode(code)?;

        let found = if deleted {
            self.repository.soft_delete(id).await?
        } else {
            self.repository.restore(id).await?
        };
        if !found {
            return Err(ShortenerError::NotFound);
        }

        info!(id, code, deleted, "changed mapping state");
        self.notifier.notify(id).await;
        Ok(())
    }
}

impl<R> Clone for ShortenerService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            codec: Arc::clone(&self.codec),
            normalizer: self.normalizer.clone(),
            policy: self.policy.clone(),
            gate: Arc::clone(&self.gate),
            notifier: self.notifier.clone(),
            url_size_limit: self.url_size_limit,
            read_only: self.read_only,
        }
    }
}

impl<R> std::fmt::Debug for ShortenerService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortenerService")
            .field("codec", &self.codec)
            .field("url_size_limit", &self.url_size_limit)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: Repository> Shortener for ShortenerService<R> {
    async fn shorten(&self, url: &str, requester: &Requester) -> Result<Shortened> {
        self.ensure_writable()?;
        self.policy.validate(url)?;

        let url = self.normalizer.normalize(url);

        if self.gate.is_blocked(requester).await {
            return Err(ShortenerError::Blocked);
        }
        if url.chars().count() > self.url_size_limit {
            return Err(ShortenerError::UrlTooLong {
                limit: self.url_size_limit,
            });
        }
        if !self.gate.ping_limiter(requester).await {
            return Err(ShortenerError::RateLimited);
        }

        let acquired = self.repository.get_or_create(&url).await?;
        trace!(?acquired, %requester, "mapped url");

        match acquired {
            Acquired::Created(id) | Acquired::Raced(id) => {
                self.notifier.notify(id).await;
                Ok(self.shortened(id))
            }
            Acquired::Existing(id) => Ok(self.shortened(id)),
            Acquired::Deleted(id) => {
                debug!(id, "url was shortened before and deleted");
                Err(ShortenerError::Deleted(self.codec.encode(id)))
            }
        }
    }

    fn validate(&self, url: &str) -> std::result::Result<(), ValidationError> {
        self.policy.validate(url)
    }

    async fn is_deleted(&self, code: &str) -> Result<bool> {
        match self.codec.decode(code) {
            Ok(id) => Ok(self.repository.is_deleted(id).await?),
            Err(err) => {
                trace!(code, error = %err, "undecodable code is not deleted");
                Ok(false)
            }
        }
    }

    async fn delete(&self, code: &str) -> Result<()> {
        self.set_deleted(code, true).await
    }

    async fn restore(&self, code: &str) -> Result<()> {
        self.set_deleted(code, false).await
    }
}
