use std::sync::Arc;

use crate::redirector::Redirector;
use async_trait::async_trait;
use tracing::{debug, trace};
use wormhole_core::{convert_to_protocol, IdCodec, Protocol, ReadRepository};

/// Service for handling URL redirects.
///
/// Decodes the code with the shared codec, looks the id up in a read-only
/// repository and expands the stored URL to the requested protocol.
#[derive(Debug)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
    codec: Arc<IdCodec>,
}

impl<R> Clone for RedirectorService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<R: ReadRepository> RedirectorService<R> {
    pub fn new(repository: Arc<R>, codec: Arc<IdCodec>) -> Self {
        Self { repository, codec }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Resolves a short code to its target URL.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - The target, using `protocol`
    /// * `Ok(None)` - The code is malformed, unknown or deleted
    /// * `Err(e)` - The repository could not be read
    pub async fn resolve(&self, code: &str, protocol: Protocol) -> crate::Result<Option<String>> {
        Redirector::resolve(self, code, protocol).await
    }
}

#[async_trait]
impl<R: ReadRepository> Redirector for RedirectorService<R> {
    async fn resolve(&self, code: &str, protocol: Protocol) -> crate::Result<Option<String>> {
        let id = match self.codec.decode(code) {
            Ok(id) => id,
            Err(err) => {
                trace!(code, error = %err, "short code does not decode");
                return Ok(None);
            }
        };

        match self.repository.resolve(id).await? {
            Some(url) => {
                let url = convert_to_protocol(&url, protocol);
                debug!(code, id, url = %url, "resolved short code");
                Ok(Some(url))
            }
            None => {
                trace!(code, id, "short code not found");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wormhole_core::{CodecSettings, Repository};
    use wormhole_storage::InMemoryRepository;

    async fn setup(urls: &[&str]) -> RedirectorService<InMemoryRepository> {
        let repo = InMemoryRepository::new();
        for url in urls {
            repo.get_or_create(url).await.unwrap();
        }
        let codec = IdCodec::new(CodecSettings::default()).unwrap();
        RedirectorService::new(Arc::new(repo), Arc::new(codec))
    }

    #[tokio::test]
    async fn resolve_primary_and_alternate_codes() {
        let service = setup(&["http://example.org/wiki/Foo"]).await;

        for code in ["3", "_z"] {
            let url = service.resolve(code, Protocol::Http).await.unwrap();
            assert_eq!(url.as_deref(), Some("http://example.org/wiki/Foo"), "{code}");
        }
    }

    #[tokio::test]
    async fn resolve_converts_protocol() {
        let service = setup(&["http://example.org/a?b=c"]).await;

        let https = service.resolve("3", Protocol::Https).await.unwrap();
        assert_eq!(https.as_deref(), Some("https://example.org/a?b=c"));

        let relative = service.resolve("3", Protocol::Relative).await.unwrap();
        assert_eq!(relative.as_deref(), Some("//example.org/a?b=c"));
    }

    #[tokio::test]
    async fn resolve_folds_confusables() {
        let codec = IdCodec::new(CodecSettings::default()).unwrap();
        let id = codec.decode("io").unwrap();
        let owned: Vec<String> = (1..=id).map(|i| format!("http://example.org/{i}")).collect();
        let urls: Vec<&str> = owned.iter().map(String::as_str).collect();
        let service = setup(&urls).await;

        let expected = format!("http://example.org/{id}");
        for code in ["io", "10", "lO", "I0"] {
            let url = service.resolve(code, Protocol::Http).await.unwrap();
            assert_eq!(url.as_deref(), Some(expected.as_str()), "{code}");
        }
    }

    #[tokio::test]
    async fn resolve_nonexistent_or_garbage() {
        let service = setup(&[]).await;
        let too_long = "3".repeat(30);

        for code in ["3", "", "_", "not/a code", too_long.as_str()] {
            assert_eq!(service.resolve(code, Protocol::Http).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn resolve_hides_deleted() {
        let service = setup(&["http://example.org/"]).await;
        service.repository().soft_delete(1).await.unwrap();

        assert_eq!(service.resolve("3", Protocol::Http).await.unwrap(), None);

        service.repository().restore(1).await.unwrap();
        assert!(service.resolve("3", Protocol::Http).await.unwrap().is_some());
    }
}
