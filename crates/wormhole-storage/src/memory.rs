use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use wormhole_core::repository::{
    InsertOutcome, ReadRepository, Repository, Result, ShortcodeEntry,
};
use wormhole_core::UrlHash;

/// In-memory storage row.
#[derive(Debug, Clone)]
struct Row {
    url: String,
    url_hash: UrlHash,
    deleted: bool,
}

impl Row {
    fn to_entry(&self, id: u64) -> ShortcodeEntry {
        ShortcodeEntry {
            id,
            url: self.url.clone(),
            url_hash: self.url_hash.clone(),
            deleted: self.deleted,
        }
    }
}

#[derive(Debug)]
struct Inner {
    /// Unique index on the url hash.
    index: DashMap<UrlHash, u64>,
    rows: RwLock<BTreeMap<u64, Row>>,
    next_id: AtomicU64,
}

/// In-memory implementation of the Repository trait.
///
/// The url-hash index is a DashMap: its entry API locks one shard for the
/// check-and-insert, which plays the role of the unique constraint. Rows live
/// in an ordered map so exports come out in id order. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    inner: Arc<Inner>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository. Ids start at 1.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                index: DashMap::new(),
                rows: RwLock::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of rows, deleted ones included.
    pub fn len(&self) -> usize {
        self.inner.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_hash(&self, hash: &UrlHash) -> Result<Option<ShortcodeEntry>> {
        let Some(id) = self.inner.index.get(hash).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.inner.rows.read().get(&id).map(|row| row.to_entry(id)))
    }

    async fn resolve(&self, id: u64) -> Result<Option<String>> {
        Ok(self
            .inner
            .rows
            .read()
            .get(&id)
            .filter(|row| !row.deleted)
            .map(|row| row.url.clone()))
    }

    async fn is_deleted(&self, id: u64) -> Result<bool> {
        Ok(self
            .inner
            .rows
            .read()
            .get(&id)
            .is_some_and(|row| row.deleted))
    }

    async fn scan_active(&self, after_id: u64, limit: usize) -> Result<Vec<ShortcodeEntry>> {
        Ok(self
            .inner
            .rows
            .read()
            .range((Bound::Excluded(after_id), Bound::Unbounded))
            .filter(|(_, row)| !row.deleted)
            .take(limit)
            .map(|(&id, row)| row.to_entry(id))
            .collect())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, url: &str, hash: &UrlHash) -> Result<InsertOutcome> {
        match self.inner.index.entry(hash.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Conflict),
            Entry::Vacant(slot) => {
                let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                // The row must exist before the index entry becomes visible.
                self.inner.rows.write().insert(
                    id,
                    Row {
                        url: url.to_owned(),
                        url_hash: hash.clone(),
                        deleted: false,
                    },
                );
                slot.insert(id);
                Ok(InsertOutcome::Inserted(id))
            }
        }
    }

    async fn find_id_for_update(&self, hash: &UrlHash) -> Result<Option<u64>> {
        Ok(self.inner.index.get(hash).map(|id| *id))
    }

    async fn soft_delete(&self, id: u64) -> Result<bool> {
        Ok(set_deleted(&self.inner.rows, id, true))
    }

    async fn restore(&self, id: u64) -> Result<bool> {
        Ok(set_deleted(&self.inner.rows, id, false))
    }
}

fn set_deleted(rows: &RwLock<BTreeMap<u64, Row>>, id: u64, deleted: bool) -> bool {
    match rows.write().get_mut(&id) {
        Some(row) => {
            row.deleted = deleted;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wormhole_core::Acquired;

    #[tokio::test]
    async fn insert_and_find() {
        let repo = InMemoryRepository::new();
        let hash = UrlHash::of("http://example.org/");

        let outcome = repo.insert("http://example.org/", &hash).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Inserted(1));

        let entry = repo.find_by_hash(&hash).await.unwrap().unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.url, "http://example.org/");
        assert!(!entry.deleted);
    }

    #[tokio::test]
    async fn insert_conflict_on_same_hash() {
        let repo = InMemoryRepository::new();
        let hash = UrlHash::of("http://example.org/");

        repo.insert("http://example.org/", &hash).await.unwrap();
        let outcome = repo.insert("http://example.org/", &hash).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Conflict);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find_id_for_update(&hash).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let repo = InMemoryRepository::new();
        for i in 1..=5u64 {
            let url = format!("http://example.org/{i}");
            let outcome = repo.insert(&url, &UrlHash::of(&url)).await.unwrap();
            assert_eq!(outcome, InsertOutcome::Inserted(i));
        }
    }

    #[tokio::test]
    async fn resolve_hides_deleted_rows() {
        let repo = InMemoryRepository::new();
        let url = "http://example.org/1";
        repo.insert(url, &UrlHash::of(url)).await.unwrap();

        assert_eq!(repo.resolve(1).await.unwrap().as_deref(), Some(url));
        assert!(repo.soft_delete(1).await.unwrap());
        assert_eq!(repo.resolve(1).await.unwrap(), None);
        assert!(repo.is_deleted(1).await.unwrap());

        assert!(repo.restore(1).await.unwrap());
        assert_eq!(repo.resolve(1).await.unwrap().as_deref(), Some(url));
        assert!(!repo.is_deleted(1).await.unwrap());
    }

    #[tokio::test]
    async fn delete_and_restore_missing_row() {
        let repo = InMemoryRepository::new();
        assert!(!repo.soft_delete(42).await.unwrap());
        assert!(!repo.restore(42).await.unwrap());
        assert!(!repo.is_deleted(42).await.unwrap());
        assert_eq!(repo.resolve(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_skips_deleted_and_respects_cursor() {
        let repo = InMemoryRepository::new();
        for i in 0..6 {
            let url = format!("http://example.org/{i}");
            repo.insert(&url, &UrlHash::of(&url)).await.unwrap();
        }
        repo.soft_delete(2).await.unwrap();

        let first = repo.scan_active(0, 3).await.unwrap();
        let ids: Vec<u64> = first.iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 3, 4]);

        let rest = repo.scan_active(4, 3).await.unwrap();
        let ids: Vec<u64> = rest.iter().map(|e| e.id).collect();
        assert_eq!(ids, [5, 6]);

        assert!(repo.scan_active(u64::MAX, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_or_create_reports_deleted() {
        let repo = InMemoryRepository::new();
        let url = "http://example.org/";

        assert_eq!(repo.get_or_create(url).await.unwrap(), Acquired::Created(1));
        assert_eq!(repo.get_or_create(url).await.unwrap(), Acquired::Existing(1));

        repo.soft_delete(1).await.unwrap();
        assert_eq!(repo.get_or_create(url).await.unwrap(), Acquired::Deleted(1));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_get_or_create_converges() {
        let repo = InMemoryRepository::new();
        let mut handles = vec![];

        for _ in 0..32 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.get_or_create("http://example.org/race").await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            let acquired = handle.await.unwrap();
            assert_eq!(acquired.id(), 1);
            if matches!(acquired, Acquired::Created(_)) {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.len(), 1);
    }
}
