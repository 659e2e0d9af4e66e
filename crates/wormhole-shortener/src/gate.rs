use crate::config::RateLimitSettings;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Whoever is asking for a short URL: an account name, an IP, a client id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requester(String);

impl Requester {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission checks run before a new mapping may be created.
#[async_trait]
pub trait Gatekeeper: Send + Sync + 'static {
    /// Whether the requester is barred from creating short URLs.
    async fn is_blocked(&self, requester: &Requester) -> bool;

    /// Counts one attempt. Returns `false` once the requester is over its limit.
    async fn ping_limiter(&self, requester: &Requester) -> bool;
}

/// Lets everyone through.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

#[async_trait]
impl Gatekeeper for OpenGate {
    async fn is_blocked(&self, _requester: &Requester) -> bool {
        false
    }

    async fn ping_limiter(&self, _requester: &Requester) -> bool {
        true
    }
}

/// Per-requester fixed-window limiter with a static block list.
///
/// A window opens with a requester's first attempt and lasts `window`; the
/// counter lives in a Moka entry whose time-to-live is the window.
#[derive(Debug, Clone)]
pub struct FixedWindowGate {
    max_requests: u32,
    windows: Cache<Requester, Arc<AtomicU32>>,
    blocked: Arc<HashSet<Requester>>,
}

impl FixedWindowGate {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            windows: Cache::builder()
                .time_to_live(settings.window())
                .build(),
            blocked: Arc::new(HashSet::new()),
        }
    }

    pub fn with_blocked(mut self, blocked: impl IntoIterator<Item = Requester>) -> Self {
        self.blocked = Arc::new(blocked.into_iter().collect());
        self
    }
}

#[async_trait]
impl Gatekeeper for FixedWindowGate {
    async fn is_blocked(&self, requester: &Requester) -> bool {
        self.blocked.contains(requester)
    }

    async fn ping_limiter(&self, requester: &Requester) -> bool {
        let counter = self
            .windows
            .get_with_by_ref(requester, async { Arc::new(AtomicU32::new(0)) })
            .await;
        let seen = counter.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if seen > self.max_requests {
            debug!(%requester, seen, "rate limit exceeded");
            return false;
        }
        true
    }
}
