use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wormhole_core::{IdCodec, Purger};

/// Tells caches that the mapping behind an id changed.
///
/// Every spelling that decodes to the id is purged: the primary and alternate
/// encodings, each expanded over the confusable mapping.
///
/// The local purger (the process's own resolve cache) is awaited, so a
/// change is visible to this process once [`PurgeNotifier::notify`] returns.
/// The remote purger runs in the background.
#[derive(Clone)]
pub struct PurgeNotifier {
    codec: Arc<IdCodec>,
    local: Option<Arc<dyn Purger>>,
    purger: Arc<dyn Purger>,
}

impl PurgeNotifier {
    pub fn new(codec: Arc<IdCodec>, purger: Arc<dyn Purger>) -> Self {
        Self {
            codec,
            local: None,
            purger,
        }
    }

    /// Purges `local` inline before the background purge is dispatched.
    pub fn with_local(mut self, local: Arc<dyn Purger>) -> Self {
        self.local = Some(local);
        self
    }

    /// All strings a client could have used to reach `id`.
    pub fn affected_codes(&self, id: u64) -> BTreeSet<String> {
        let mut codes = self.codec.confusable_variants(&self.codec.encode(id));
        codes.extend(self.codec.confusable_variants(&self.codec.encode_alt(id)));
        codes
    }

    /// Purges `id` from the local cache, then from the remote purger in the
    /// background. Failures are logged and dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn notify(&self, id: u64) -> JoinHandle<()> {
        let codes = self.affected_codes(id);

        if let Some(local) = &self.local {
            if let Err(err) = local.purge(id, &codes).await {
                warn!(id, error = %err, "failed to purge local cache");
            }
        }

        let purger = Arc::clone(&self.purger);

        tokio::spawn(async move {
            match purger.purge(id, &codes).await {
                Ok(()) => debug!(id, codes = codes.len(), "purged short codes"),
                Err(err) => warn!(id, error = %err, "failed to purge short codes"),
            }
        })
    }
}

impl std::fmt::Debug for PurgeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeNotifier")
            .field("codec", &self.codec)
            .field("local", &self.local.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MokaUrlCache, NoopPurger};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use wormhole_core::{CacheError, CodecSettings, UrlCache};

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(u64, BTreeSet<String>)>>,
    }

    #[async_trait]
    impl Purger for Recording {
        async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<(), CacheError> {
            self.calls.lock().push((id, codes.clone()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Purger for Failing {
        async fn purge(&self, _id: u64, _codes: &BTreeSet<String>) -> Result<(), CacheError> {
            Err(CacheError::Operation("boom".into()))
        }
    }

    fn codec() -> Arc<IdCodec> {
        Arc::new(IdCodec::new(CodecSettings::default()).unwrap())
    }

    #[test]
    fn affected_codes_cover_both_encodings() {
        let notifier = PurgeNotifier::new(codec(), Arc::new(NoopPurger));

        let codes = notifier.affected_codes(1);
        assert_eq!(codes, BTreeSet::from(["3".to_string(), "_z".to_string()]));
    }

    #[test]
    fn affected_codes_expand_confusables() {
        let codec = codec();
        let notifier = PurgeNotifier::new(codec.clone(), Arc::new(NoopPurger));
        let id = codec.decode("io").unwrap();

        let codes = notifier.affected_codes(id);

        // i <- {1, I, l}, o <- {0, O}
        for code in ["io", "10", "lO", "I0"] {
            assert!(codes.contains(code), "missing {code}");
        }
        for code in &codes {
            assert_eq!(codec.decode(code).unwrap(), id);
        }
    }

    #[tokio::test]
    async fn notify_passes_codes_to_the_purger() {
        let recording = Arc::new(Recording::default());
        let notifier = PurgeNotifier::new(codec(), recording.clone());

        notifier.notify(1).await.await.unwrap();

        let calls = recording.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 1);
        assert!(calls[0].1.contains("_z"));
    }

    #[tokio::test]
    async fn notify_swallows_failures() {
        let notifier = PurgeNotifier::new(codec(), Arc::new(Failing));
        notifier.notify(1).await.await.unwrap();
    }

    #[tokio::test]
    async fn notify_clears_moka_entry() {
        let cache = MokaUrlCache::new();
        cache.set_url(5, None).await.unwrap();
        let notifier = PurgeNotifier::new(codec(), Arc::new(cache.clone()));

        notifier.notify(5).await.await.unwrap();

        assert_eq!(cache.get_url(5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn local_purge_is_done_when_notify_returns() {
        let cache = MokaUrlCache::new();
        cache
            .set_url(1, Some("http://example.org/".into()))
            .await
            .unwrap();
        let recording = Arc::new(Recording::default());
        let notifier =
            PurgeNotifier::new(codec(), recording.clone()).with_local(Arc::new(cache.clone()));

        let remote = notifier.notify(1).await;
        assert_eq!(cache.get_url(1).await.unwrap(), None);

        remote.await.unwrap();
        assert_eq!(recording.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn local_failures_do_not_stop_the_remote_purge() {
        let recording = Arc::new(Recording::default());
        let notifier =
            PurgeNotifier::new(codec(), recording.clone()).with_local(Arc::new(Failing));

        notifier.notify(1).await.await.unwrap();
        assert_eq!(recording.calls.lock().len(), 1);
    }
}
