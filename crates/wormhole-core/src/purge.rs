use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Something that may hold a stale view of a short code.
///
/// Called after a mapping is created, deleted or restored, with every
/// spelling of the id's short codes. An in-process cache keyed by id only
/// needs the id.
///
/// Caches keyed by URL, such as a CDN, must purge each code on its own:
/// build the short URL for every entry of `codes` with a
/// [`ShortUrlTemplate`](crate::ShortUrlTemplate) and issue one purge per URL.
/// Purging only the primary code leaves the alternate and confusable
/// spellings cached.
#[async_trait]
pub trait Purger: Send + Sync + 'static {
    async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<()>;
}

#[async_trait]
impl<P: Purger + ?Sized> Purger for Arc<P> {
    async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<()> {
        (**self).purge(id, codes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecSettings, IdCodec, ShortCode, ShortUrlTemplate};
    use std::sync::Mutex;

    /// Purges by URL, one request per code.
    struct UrlPurger {
        template: ShortUrlTemplate,
        purged: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Purger for UrlPurger {
        async fn purge(&self, _id: u64, codes: &BTreeSet<String>) -> Result<()> {
            let mut purged = self.purged.lock().map_err(|e| CacheError::Operation(e.to_string()))?;
            for code in codes {
                purged.push(self.template.make_url(&ShortCode::new_unchecked(code.as_str())));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn url_keyed_purger_gets_every_spelling() {
        let codec = IdCodec::new(CodecSettings::default()).unwrap();
        let id = codec.decode("io").unwrap();
        let mut codes = codec.confusable_variants(&codec.encode(id));
        codes.extend(codec.confusable_variants(&codec.encode_alt(id)));

        let purger = Arc::new(UrlPurger {
            template: ShortUrlTemplate::new("https://example.org", "/$1"),
            purged: Mutex::new(Vec::new()),
        });
        let shared: Arc<dyn Purger> = purger.clone();
        shared.purge(id, &codes).await.unwrap();

        let purged = purger.purged.lock().unwrap();
        assert_eq!(purged.len(), codes.len());
        for code in ["io", "10", "lO", "I0"] {
            assert!(purged.contains(&format!("https://example.org/{code}")), "{code}");
        }
    }
}
