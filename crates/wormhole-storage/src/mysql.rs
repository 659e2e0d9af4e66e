use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};
use wormhole_core::error::StorageError;
use wormhole_core::repository::{
    InsertOutcome, ReadRepository, Repository, Result, ShortcodeEntry,
};
use wormhole_core::UrlHash;

const SCHEMA: &str = include_str!("../ddl/mysql/shortcodes.sql");

/// MySQL implementation of the repository contract.
///
/// Reads that only feed a response (`find_by_hash`, `resolve`, `is_deleted`,
/// `scan_active`) go to the replica pool. Writes, and the locking re-read
/// after an insert conflict, always go to the primary.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    primary: MySqlPool,
    replica: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository that reads and writes through one pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            replica: pool.clone(),
            primary: pool,
        }
    }

    /// Creates a repository with a separate read replica.
    pub fn with_replica(primary: MySqlPool, replica: MySqlPool) -> Self {
        Self { primary, replica }
    }

    /// Opens pools for the primary and, if given, a replica.
    pub async fn connect(primary_url: &str, replica_url: Option<&str>) -> Result<Self> {
        let primary = MySqlPool::connect(primary_url)
            .await
            .map_err(map_sqlx_error)?;
        let replica = match replica_url {
            Some(url) => MySqlPool::connect(url).await.map_err(map_sqlx_error)?,
            None => primary.clone(),
        };
        Ok(Self::with_replica(primary, replica))
    }

    /// Creates the `shortcodes` table on the primary if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.primary)
            .await
            .map_err(map_sqlx_error)?;
        info!("shortcodes schema is in place");
        Ok(())
    }

    /// Returns a reference to the primary pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.primary
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn entry_from_row(row: &MySqlRow) -> Result<ShortcodeEntry> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let url: String = row.try_get("url").map_err(map_sqlx_error)?;
    let url_hash: String = row.try_get("url_hash").map_err(map_sqlx_error)?;
    let deleted: bool = row.try_get("deleted").map_err(map_sqlx_error)?;

    Ok(ShortcodeEntry {
        id,
        url,
        url_hash: UrlHash::from_stored(url_hash),
        deleted,
    })
}

impl MySqlRepository {
    async fn set_deleted(&self, id: u64, deleted: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE shortcodes
            SET deleted = ?
            WHERE id = ?
            "#,
        )
        .bind(deleted)
        .bind(id)
        .execute(&self.primary)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // MySQL reports matched-but-unchanged rows as unaffected.
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM shortcodes
            WHERE id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.primary)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_hash(&self, hash: &UrlHash) -> Result<Option<ShortcodeEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, url, url_hash, deleted
            FROM shortcodes
            WHERE url_hash = ?
            LIMIT 1
            "#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.replica)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn resolve(&self, id: u64) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT url
            FROM shortcodes
            WHERE id = ?
              AND deleted = 0
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.replica)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let url: String = row.try_get("url").map_err(map_sqlx_error)?;
        Ok(Some(url))
    }

    async fn is_deleted(&self, id: u64) -> Result<bool> {
        let deleted = sqlx::query(
            r#"
            SELECT 1
            FROM shortcodes
            WHERE id = ?
              AND deleted = 1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.replica)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(deleted)
    }

    async fn scan_active(&self, after_id: u64, limit: usize) -> Result<Vec<ShortcodeEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, url, url_hash, deleted
            FROM shortcodes
            WHERE id > ?
              AND deleted = 0
            ORDER BY id ASC
            LIMIT ?
            "#,
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.replica)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, url: &str, hash: &UrlHash) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO shortcodes (url, url_hash, deleted)
            VALUES (?, ?, 0)
            "#,
        )
        .bind(url)
        .bind(hash.as_str())
        .execute(&self.primary)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_id();
                debug!(id, "inserted shortcode row");
                Ok(InsertOutcome::Inserted(id))
            }
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find_id_for_update(&self, hash: &UrlHash) -> Result<Option<u64>> {
        let row = sqlx::query(
            r#"
            SELECT id
            FROM shortcodes
            WHERE url_hash = ?
            LIMIT 1
            FOR SHARE
            "#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.primary)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get::<u64, _>("id").map_err(map_sqlx_error))
            .transpose()
    }

    async fn soft_delete(&self, id: u64) -> Result<bool> {
        self.set_deleted(id, true).await
    }

    async fn restore(&self, id: u64) -> Result<bool> {
        self.set_deleted(id, false).await
    }
}
