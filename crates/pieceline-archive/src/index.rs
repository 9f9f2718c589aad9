//! The archive store handle and its queries.
//!
//! All queries bind parameters positionally and operate on the `binaries`
//! table created by `migrations/`. Push times are compared through
//! `julianday()` so rows in either stored layout order by instant.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::ArchiveError;
use crate::record::{format_timestamp, parse_timestamp, ArchiveRecord};

const FILE_POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, binary_id, version, path, date_pushed FROM binaries";

/// Handle to an open archive store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    pool: SqlitePool,
}

impl ArchiveIndex {
    /// Open (creating if absent) a file-backed store and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_POOL_SIZE)
            .connect_with(opts)
            .await
            .map_err(|source| ArchiveError::Open {
                path: path.display().to_string(),
                source,
            })?;

        let index = Self { pool };
        index.migrate().await?;
        tracing::info!(path = %path.display(), "opened archive store");
        Ok(index)
    }

    /// Open a private in-memory store. The single connection is pinned for
    /// the life of the handle, since the database dies with it.
    pub async fn open_in_memory() -> Result<Self, ArchiveError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|source| {
            ArchiveError::Open {
                path: ":memory:".into(),
                source,
            }
        })?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|source| ArchiveError::Open {
                path: ":memory:".into(),
                source,
            })?;

        let index = Self { pool };
        index.migrate().await?;
        Ok(index)
    }

    async fn migrate(&self) -> Result<(), ArchiveError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Cheap liveness query against the store.
    pub async fn ping(&self) -> Result<(), ArchiveError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Record a materialized version pushed now. Returns `false` when the
    /// pair was already present.
    pub async fn record(
        &self,
        binary_id: &str,
        version: &str,
        path: &str,
    ) -> Result<bool, ArchiveError> {
        self.record_at(binary_id, version, path, Utc::now()).await
    }

    /// Record a materialized version with an explicit push time.
    pub async fn record_at(
        &self,
        binary_id: &str,
        version: &str,
        path: &str,
        pushed_at: DateTime<Utc>,
    ) -> Result<bool, ArchiveError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO binaries (binary_id, version, path, date_pushed)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(binary_id)
        .bind(version)
        .bind(path)
        .bind(format_timestamp(pushed_at))
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            tracing::info!(binary_id, version, path, "archived version");
        } else {
            tracing::debug!(binary_id, version, "version already archived");
        }
        Ok(inserted)
    }

    /// Whether `(binary_id, version)` has been recorded.
    pub async fn contains(&self, binary_id: &str, version: &str) -> Result<bool, ArchiveError> {
        Ok(self.find(binary_id, version).await?.is_some())
    }

    /// The record for one exact pair, if present.
    pub async fn find(
        &self,
        binary_id: &str,
        version: &str,
    ) -> Result<Option<ArchiveRecord>, ArchiveError> {
        let row = sqlx::query_as::<_, BinaryRow>(&format!(
            "{SELECT_COLUMNS} WHERE binary_id = ?1 AND version = ?2"
        ))
        .bind(binary_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BinaryRow::into_record).transpose()
    }

    /// Most recently pushed record for `binary_id`.
    pub async fn latest(&self, binary_id: &str) -> Result<Option<ArchiveRecord>, ArchiveError> {
        let row = sqlx::query_as::<_, BinaryRow>(&format!(
            "{SELECT_COLUMNS} WHERE binary_id = ?1 ORDER BY julianday(date_pushed) DESC, id DESC LIMIT 1"
        ))
        .bind(binary_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BinaryRow::into_record).transpose()
    }

    /// Every record for `binary_id`, newest first.
    pub async fn all_versions(&self, binary_id: &str) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let rows = sqlx::query_as::<_, BinaryRow>(&format!(
            "{SELECT_COLUMNS} WHERE binary_id = ?1 ORDER BY julianday(date_pushed) DESC, id DESC"
        ))
        .bind(binary_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BinaryRow::into_record).collect()
    }

    /// Delete every record pushed strictly before `threshold`. Returns the
    /// number of rows removed.
    pub async fn purge_older_than(&self, threshold: DateTime<Utc>) -> Result<u64, ArchiveError> {
        let result = sqlx::query("DELETE FROM binaries WHERE julianday(date_pushed) < julianday(?1)")
            .bind(format_timestamp(threshold))
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        tracing::info!(threshold = %threshold, removed, "purged archive records");
        Ok(removed)
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct BinaryRow {
    id: i64,
    binary_id: String,
    version: String,
    path: String,
    date_pushed: String,
}

impl BinaryRow {
    fn into_record(self) -> Result<ArchiveRecord, ArchiveError> {
        let date_pushed = parse_timestamp(&self.date_pushed).ok_or_else(|| ArchiveError::Timestamp {
            id: self.id,
            value: self.date_pushed.clone(),
        })?;
        Ok(ArchiveRecord {
            id: self.id,
            binary_id: self.binary_id,
            version: self.version,
            path: self.path,
            date_pushed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[tokio::test]
    async fn duplicate_record_is_a_noop() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        assert!(index.record("osrs", "1.0", "/p").await.unwrap());
        assert!(!index.record("osrs", "1.0", "/p").await.unwrap());
        assert_eq!(index.all_versions("osrs").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_keeps_first_path() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record("osrs", "1.0", "/first").await.unwrap();
        index.record("osrs", "1.0", "/second").await.unwrap();
        let rec = index.find("osrs", "1.0").await.unwrap().unwrap();
        assert_eq!(rec.path, "/first");
    }

    #[tokio::test]
    async fn latest_follows_push_order() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record("osrs", "1.0", "/a").await.unwrap();
        index.record("osrs", "2.0", "/b").await.unwrap();
        let latest = index.latest("osrs").await.unwrap().unwrap();
        assert_eq!(latest.version, "2.0");
        assert_eq!(latest.path, "/b");
    }

    #[tokio::test]
    async fn latest_uses_timestamp_not_version_string() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record_at("osrs", "9.0", "/old", at(0)).await.unwrap();
        index.record_at("osrs", "10.0", "/new", at(60)).await.unwrap();
        assert_eq!(index.latest("osrs").await.unwrap().unwrap().version, "10.0");
    }

    #[tokio::test]
    async fn same_timestamp_breaks_ties_by_insertion() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record_at("osrs", "a", "/a", at(0)).await.unwrap();
        index.record_at("osrs", "b", "/b", at(0)).await.unwrap();
        let versions: Vec<String> = index
            .all_versions("osrs")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, ["b", "a"]);
    }

    #[tokio::test]
    async fn latest_for_unknown_id_is_none() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record("osrs", "1.0", "/p").await.unwrap();
        assert!(index.latest("rs3").await.unwrap().is_none());
        assert!(index.all_versions("rs3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_versions_newest_first_and_scoped() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record_at("osrs", "1", "/1", at(0)).await.unwrap();
        index.record_at("osrs", "3", "/3", at(20)).await.unwrap();
        index.record_at("osrs", "2", "/2", at(10)).await.unwrap();
        index.record_at("other", "x", "/x", at(30)).await.unwrap();
        let versions: Vec<String> = index
            .all_versions("osrs")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, ["3", "2", "1"]);
    }

    #[tokio::test]
    async fn purge_is_strictly_older_than() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record_at("osrs", "1", "/1", at(0)).await.unwrap();
        index.record_at("osrs", "2", "/2", at(10)).await.unwrap();
        index.record_at("osrs", "3", "/3", at(20)).await.unwrap();

        assert_eq!(index.purge_older_than(at(10)).await.unwrap(), 1);
        let left = index.all_versions("osrs").await.unwrap();
        assert_eq!(left.len(), 2);
        assert!(left.iter().all(|r| r.date_pushed >= at(10)));
    }

    #[tokio::test]
    async fn purge_on_empty_store_is_noop() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        assert_eq!(index.purge_older_than(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn purged_pair_can_be_recorded_again() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index.record_at("osrs", "1", "/1", at(0)).await.unwrap();
        index.purge_older_than(at(1)).await.unwrap();
        assert!(!index.contains("osrs", "1").await.unwrap());
        assert!(index.record("osrs", "1", "/1").await.unwrap());
    }

    #[tokio::test]
    async fn reads_rows_with_sqlite_default_timestamp() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO binaries (binary_id, version, path, date_pushed)
             VALUES ('osrs', 'legacy', '/l', '2023-03-04 05:06:07')",
        )
        .execute(&index.pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO binaries (binary_id, version, path) VALUES ('osrs', 'dflt', '/d')")
            .execute(&index.pool)
            .await
            .unwrap();

        let legacy = index.find("osrs", "legacy").await.unwrap().unwrap();
        assert_eq!(legacy.date_pushed, Utc.with_ymd_and_hms(2023, 3, 4, 5, 6, 7).unwrap());
        assert_eq!(index.latest("osrs").await.unwrap().unwrap().version, "dflt");
    }

    #[tokio::test]
    async fn purge_keeps_newer_sqlite_default_rows() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO binaries (binary_id, version, path, date_pushed)
             VALUES ('osrs', 'legacy', '/l', '2024-01-02 03:04:05')",
        )
        .execute(&index.pool)
        .await
        .unwrap();

        let threshold = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
        assert_eq!(index.purge_older_than(threshold).await.unwrap(), 0);
        assert!(index.contains("osrs", "legacy").await.unwrap());

        let later = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 6).unwrap();
        assert_eq!(index.purge_older_than(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mixed_layouts_order_by_instant() {
        let index = ArchiveIndex::open_in_memory().await.unwrap();
        index
            .record_at("osrs", "early", "/e", Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO binaries (binary_id, version, path, date_pushed)
             VALUES ('osrs', 'legacy', '/l', '2024-01-02 03:04:05')",
        )
        .execute(&index.pool)
        .await
        .unwrap();
        index
            .record_at("osrs", "late", "/z", Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap())
            .await
            .unwrap();

        let versions: Vec<String> = index
            .all_versions("osrs")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, ["legacy", "early", "late"]);
        assert_eq!(index.latest("osrs").await.unwrap().unwrap().version, "legacy");
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("binaries.db");

        let index = ArchiveIndex::open(&db).await.unwrap();
        index.record("osrs", "231", "/out/osrs/231").await.unwrap();
        index.close().await;

        let reopened = ArchiveIndex::open(&db).await.unwrap();
        assert!(reopened.contains("osrs", "231").await.unwrap());
        reopened.ping().await.unwrap();
        reopened.close().await;
    }

    #[tokio::test]
    async fn concurrent_duplicate_inserts_leave_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let index = ArchiveIndex::open(dir.path().join("binaries.db")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let index = index.clone();
            handles.push(tokio::spawn(async move {
                index.record("osrs", "1.0", "/p").await.unwrap()
            }));
        }
        let mut inserted = 0;
        for h in handles {
            if h.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(index.all_versions("osrs").await.unwrap().len(), 1);
    }
}
