use crate::error::StorageError;
use crate::hash::UrlHash;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcodeEntry {
    /// Auto-assigned, never reused.
    pub id: u64,
    /// The normalized target URL. Write-once.
    pub url: String,
    pub url_hash: UrlHash,
    pub deleted: bool,
}

/// What an insert on the primary store did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written and got this id.
    Inserted(u64),
    /// Another row already holds the url hash.
    Conflict,
}

/// Result of [`Repository::get_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// This call wrote the row.
    Created(u64),
    /// The insert lost a race; the id is the winner's.
    Raced(u64),
    /// An active row was already there.
    Existing(u64),
    /// A row exists but is soft-deleted. It is not recreated.
    Deleted(u64),
}

impl Acquired {
    pub fn id(self) -> u64 {
        match self {
            Acquired::Created(id)
            | Acquired::Raced(id)
            | Acquired::Existing(id)
            | Acquired::Deleted(id) => id,
        }
    }
}

/// A read-only view of the mapping table.
///
/// Implementations may serve these from a replica; none of them is used to
/// decide anything after a failed write.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Looks up the row holding `hash`, deleted or not.
    async fn find_by_hash(&self, hash: &UrlHash) -> Result<Option<ShortcodeEntry>>;

    /// Returns the URL for `id`, or `None` if there is no such row or it is deleted.
    async fn resolve(&self, id: u64) -> Result<Option<String>>;

    /// Whether a row with `id` exists and is soft-deleted.
    async fn is_deleted(&self, id: u64) -> Result<bool>;

    /// Up to `limit` active rows with `id > after_id`, in ascending id order.
    async fn scan_active(&self, after_id: u64, limit: usize) -> Result<Vec<ShortcodeEntry>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new active row on the primary store.
    ///
    /// A unique violation on the url hash is reported as
    /// [`InsertOutcome::Conflict`], not as an error.
    async fn insert(&self, url: &str, hash: &UrlHash) -> Result<InsertOutcome>;

    /// Reads the id holding `hash` from the primary store with a locking read,
    /// so a row committed by a concurrent writer is always visible.
    async fn find_id_for_update(&self, hash: &UrlHash) -> Result<Option<u64>>;

    /// Marks the row deleted. Returns `false` if no row has `id`.
    async fn soft_delete(&self, id: u64) -> Result<bool>;

    /// Clears the deleted flag. Returns `false` if no row has `id`.
    async fn restore(&self, id: u64) -> Result<bool>;

    /// Returns the id for `url`, creating the row if none exists.
    ///
    /// Optimistic insert, pessimistic re-read: the read goes to the fast path
    /// first, the insert relies on the storage unique constraint, and a
    /// conflict falls back to a locking read of the winner's id.
    async fn get_or_create(&self, url: &str) -> Result<Acquired> {
        let hash = UrlHash::of(url);

        if let Some(entry) = self.find_by_hash(&hash).await? {
            trace!(id = entry.id, deleted = entry.deleted, "url already mapped");
            return Ok(if entry.deleted {
                Acquired::Deleted(entry.id)
            } else {
                Acquired::Existing(entry.id)
            });
        }

        match self.insert(url, &hash).await? {
            InsertOutcome::Inserted(id) => {
                debug!(id, "created mapping");
                Ok(Acquired::Created(id))
            }
            InsertOutcome::Conflict => match self.find_id_for_update(&hash).await? {
                Some(id) => {
                    trace!(id, "insert raced, using winning row");
                    Ok(Acquired::Raced(id))
                }
                None => Err(StorageError::InvariantViolation(format!(
                    "url hash {hash} conflicted but no row holds it"
                ))),
            },
        }
    }
}
