use crate::Result;
use async_trait::async_trait;
use wormhole_core::Protocol;

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its target URL, expanded to `protocol`.
    ///
    /// Returns `None` if the code does not decode, names no row, or the row
    /// is deleted.
    async fn resolve(&self, code: &str, protocol: Protocol) -> Result<Option<String>>;
}
