use crate::error::{Result, ValidationError};
use crate::gate::Requester;
use async_trait::async_trait;
use serde::Serialize;
use wormhole_core::ShortCode;

/// Both renderings of a newly shortened (or already known) URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortened {
    pub id: u64,
    pub code: ShortCode,
    pub alt_code: ShortCode,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short codes for `url`, creating the mapping if needed.
    ///
    /// Shortening a URL that is already mapped is idempotent regardless of
    /// who asks.
    async fn shorten(&self, url: &str, requester: &Requester) -> Result<Shortened>;

    /// Runs the validation policy without creating anything.
    fn validate(&self, url: &str) -> std::result::Result<(), ValidationError>;

    /// Whether `code` points at a soft-deleted mapping. Unknown or
    /// undecodable codes are not deleted.
    async fn is_deleted(&self, code: &str) -> Result<bool>;

    /// Hides the mapping behind `code` from resolution.
    async fn delete(&self, code: &str) -> Result<()>;

    /// Undoes [`Shortener::delete`].
    async fn restore(&self, code: &str) -> Result<()>;
}
