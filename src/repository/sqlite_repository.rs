use crate::IngestError;
use crate::repository::models::{DBFile, DBLogEntry, InterruptedFile};
use crate::repository::repository::FileRepository;
use crate::stats::{Statistic, StatisticRow};
use crate::status::LogStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const STATISTIC_SELECT: &str = r#"
    SELECT f.url, f.hash, f.bitrate, f.resolution, l.status, l.message
    FROM files f
    LEFT JOIN log l ON l.file_id = f.id
"#;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database file and its parent directory.
    pub async fn new(db_path: &Path) -> Result<Self, IngestError> {
        let cwd = std::env::current_dir()?;
        let db_abs = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            cwd.join(db_path)
        };

        if let Some(parent) = db_abs.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    IngestError::Storage(format!("Failed to create directory {:?}: {}", parent, e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_abs)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        info!("[Sqlite] Opened database {:?}", db_abs);
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// A private in-memory database held by a single connection.
    pub async fn in_memory() -> Result<Self, IngestError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                hash TEXT NOT NULL,
                resolution TEXT NOT NULL DEFAULT '',
                bitrate TEXT NOT NULL DEFAULT '',
                UNIQUE(url, hash)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // status: 1 PENDING, 2 ERROR, 3 FAILED, 4 COMPLETED
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER NOT NULL REFERENCES files(id),
                status INTEGER NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_log_file_id ON log(file_id);")
            .execute(pool)
            .await?;

        debug!("[Sqlite] Schema ready");
        Ok(())
    }

    fn statistic_row(row: &SqliteRow) -> Result<StatisticRow, IngestError> {
        let status = row
            .get::<Option<i64>, _>("status")
            .map(LogStatus::from_code)
            .transpose()?;
        Ok(StatisticRow {
            url: row.get("url"),
            hash: row.get("hash"),
            bit_rate: row.get("bitrate"),
            resolution: row.get("resolution"),
            status,
            message: row.get("message"),
        })
    }

    fn statistic(rows: Vec<SqliteRow>) -> Result<Statistic, IngestError> {
        let rows = rows
            .iter()
            .map(Self::statistic_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Statistic::from_rows(rows))
    }
}

#[async_trait]
impl FileRepository for SqliteRepository {
    // ---------------- File ----------------
    async fn insert_file(&self, url: &str, hash: &str) -> Result<i64, IngestError> {
        let row = sqlx::query(
            r#"
            INSERT INTO files (url, hash, resolution, bitrate)
            VALUES (?1, ?2, '', '')
            ON CONFLICT(url, hash) DO UPDATE SET url = excluded.url
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn update_file(
        &self,
        id: i64,
        bit_rate: &str,
        resolution: &str,
    ) -> Result<(), IngestError> {
        let result = sqlx::query("UPDATE files SET bitrate = ?1, resolution = ?2 WHERE id = ?3")
            .bind(bit_rate)
            .bind(resolution)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(IngestError::Storage(format!("file {} not found", id)));
        }
        Ok(())
    }

    async fn select_file(&self, url: &str, hash: &str) -> Result<Option<i64>, IngestError> {
        let row = sqlx::query("SELECT id FROM files WHERE url = ?1 AND hash = ?2")
            .bind(url)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn load_file(&self, id: i64) -> Result<Option<DBFile>, IngestError> {
        let row = sqlx::query(
            "SELECT id, url, hash, resolution, bitrate FROM files WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| DBFile {
            id: row.get("id"),
            url: row.get("url"),
            hash: row.get("hash"),
            resolution: row.get("resolution"),
            bit_rate: row.get("bitrate"),
        }))
    }

    // ---------------- Log ----------------
    async fn append_log(
        &self,
        file_id: i64,
        status: LogStatus,
        message: &str,
    ) -> Result<(), IngestError> {
        sqlx::query(
            "INSERT INTO log (file_id, status, message, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(file_id)
        .bind(status.code())
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_logs(&self, file_id: i64) -> Result<Vec<DBLogEntry>, IngestError> {
        let rows = sqlx::query(
            "SELECT id, file_id, status, message, created_at FROM log WHERE file_id = ?1 ORDER BY id",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<DBLogEntry, IngestError> {
                Ok(DBLogEntry {
                    id: row.get("id"),
                    file_id: row.get("file_id"),
                    status: LogStatus::from_code(row.get("status"))?,
                    message: row.get("message"),
                    created_at: row.get::<DateTime<Utc>, _>("created_at"),
                })
            })
            .collect()
    }

    async fn is_completed(&self, file_id: i64) -> Result<bool, IngestError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM log WHERE file_id = ?1 AND status = ?2) AS done",
        )
        .bind(file_id)
        .bind(LogStatus::Completed.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("done") != 0)
    }

    async fn has_terminal(&self, file_id: i64) -> Result<bool, IngestError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM log WHERE file_id = ?1 AND status IN (?2, ?3)) AS finished",
        )
        .bind(file_id)
        .bind(LogStatus::Failed.code())
        .bind(LogStatus::Completed.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("finished") != 0)
    }

    async fn list_interrupted(&self) -> Result<Vec<InterruptedFile>, IngestError> {
        let rows = sqlx::query(
            r#"
            SELECT f.id, f.url, f.hash
            FROM files f
            WHERE NOT EXISTS (
                SELECT 1 FROM log l
                WHERE l.file_id = f.id AND l.status IN (?1, ?2)
            )
            ORDER BY f.id
            "#,
        )
        .bind(LogStatus::Failed.code())
        .bind(LogStatus::Completed.code())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| InterruptedFile {
                id: row.get("id"),
                url: row.get("url"),
                hash: row.get("hash"),
            })
            .collect())
    }

    // ---------------- Statistic ----------------
    async fn get_statistic(&self) -> Result<Statistic, IngestError> {
        let sql = format!("{STATISTIC_SELECT} ORDER BY f.id, l.id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Self::statistic(rows)
    }

    async fn get_statistic_by(
        &self,
        url: &str,
        hash: Option<&str>,
    ) -> Result<Statistic, IngestError> {
        let rows = match hash {
            Some(hash) => {
                let sql = format!(
                    "{STATISTIC_SELECT} WHERE f.url = ?1 AND f.hash = ?2 ORDER BY f.id, l.id"
                );
                sqlx::query(&sql)
                    .bind(url)
                    .bind(hash)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{STATISTIC_SELECT} WHERE f.url = ?1 ORDER BY f.id, l.id");
                sqlx::query(&sql).bind(url).fetch_all(&self.pool).await?
            }
        };
        Self::statistic(rows)
    }

    async fn close(&self) {
        info!("[Sqlite] Closing connection pool");
        self.pool.close().await;
    }
}
