use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;
use wormhole_core::{CacheError, Purger};

pub type Result<T> = std::result::Result<T, CacheError>;

/// A purge target for deployments without any cache in front of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPurger;

#[async_trait]
impl Purger for NoopPurger {
    async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<()> {
        trace!(id, codes = codes.len(), "nothing to purge");
        Ok(())
    }
}

/// Sends every purge to each of its targets in order.
///
/// All targets are tried even if one fails; the first failure is returned.
#[derive(Clone, Default)]
pub struct FanoutPurger {
    targets: Vec<Arc<dyn Purger>>,
}

impl FanoutPurger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn Purger>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for FanoutPurger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutPurger")
            .field("targets", &self.targets.len())
            .finish()
    }
}

#[async_trait]
impl Purger for FanoutPurger {
    async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<()> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(err) = target.purge(id, codes).await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(u64, usize)>>,
    }

    #[async_trait]
    impl Purger for Recording {
        async fn purge(&self, id: u64, codes: &BTreeSet<String>) -> Result<()> {
            self.seen.lock().push((id, codes.len()));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Purger for Failing {
        async fn purge(&self, _id: u64, _codes: &BTreeSet<String>) -> Result<()> {
            Err(CacheError::Unavailable("cdn down".into()))
        }
    }

    #[tokio::test]
    async fn noop_always_succeeds() {
        NoopPurger.purge(1, &BTreeSet::new()).await.unwrap();
    }

    #[tokio::test]
    async fn fanout_reaches_every_target_despite_failures() {
        let first = Arc::new(Recording::default());
        let last = Arc::new(Recording::default());
        let fanout = FanoutPurger::new()
            .with(first.clone())
            .with(Arc::new(Failing))
            .with(last.clone());
        assert_eq!(fanout.len(), 3);

        let codes = BTreeSet::from(["3".to_string(), "_z".to_string()]);
        let err = fanout.purge(1, &codes).await.unwrap_err();

        assert!(matches!(err, CacheError::Unavailable(_)));
        assert_eq!(*first.seen.lock(), [(1, 2)]);
        assert_eq!(*last.seen.lock(), [(1, 2)]);
    }

    #[tokio::test]
    async fn empty_fanout_is_a_noop() {
        let fanout = FanoutPurger::new();
        assert!(fanout.is_empty());
        fanout.purge(1, &BTreeSet::new()).await.unwrap();
    }
}
