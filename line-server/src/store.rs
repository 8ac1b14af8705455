//! Persistent schedule store.
//!
//! The durable tier behind the in-memory cache: one row per
//! `(line_code, valid_for, day_type)`, upserted last-write-wins. Rows are
//! tolerated past their `valid_for` date under the staleness policy, which
//! is what keeps the service answering while the upstream is down.
//!
//! SQLite via sqlx. A single-connection pool with a busy timeout avoids
//! "database is locked" failures under concurrent resolution requests;
//! each upsert is a single atomic statement, so readers never observe a
//! partially written row.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::domain::{DayType, SchedulePayload, ScheduleRecord, SourceStatus};

/// Errors from the persistent store.
///
/// At the resolver boundary these are logged and swallowed; they affect
/// durability of a record, never the value returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt row for line {line_code}: {message}")]
    Corrupt { line_code: String, message: String },
}

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS bus_schedule_cache (
    line_code     TEXT NOT NULL,
    valid_for     DATE NOT NULL,
    day_type      TEXT NOT NULL,
    payload       TEXT NOT NULL,
    source_status TEXT NOT NULL,
    error_message TEXT,
    fetched_at    TIMESTAMP NOT NULL,
    UNIQUE(line_code, valid_for, day_type)
)";

/// Persistent-store statistics for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PersistentStats {
    pub date: NaiveDate,
    pub day_type: String,
    pub rows_total: i64,
    pub rows_success: i64,
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    line_code: String,
    valid_for: NaiveDate,
    day_type: String,
    payload: String,
    source_status: String,
    error_message: Option<String>,
    fetched_at: DateTime<Utc>,
}

impl ScheduleRow {
    fn into_record(self) -> Result<ScheduleRecord, StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            line_code: self.line_code.clone(),
            message,
        };

        let day_type = DayType::parse(&self.day_type)
            .ok_or_else(|| corrupt(format!("unknown day_type {:?}", self.day_type)))?;
        let source_status = SourceStatus::parse(&self.source_status)
            .ok_or_else(|| corrupt(format!("unknown source_status {:?}", self.source_status)))?;
        let payload: SchedulePayload = serde_json::from_str(&self.payload)
            .map_err(|e| corrupt(format!("payload: {e}")))?;

        Ok(ScheduleRecord {
            line_code: self.line_code,
            valid_for: self.valid_for,
            day_type,
            payload,
            source_status,
            error_message: self.error_message,
            fetched_at: self.fetched_at,
            stale: false,
        })
    }
}

/// SQLite-backed schedule store.
#[derive(Clone)]
pub struct ScheduleStore {
    pool: Pool<Sqlite>,
}

impl ScheduleStore {
    /// Open (creating if missing) a store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", path.as_ref().display()))
                .map_err(sqlx::Error::from)?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

        Self::connect(opts).await
    }

    /// Open an in-memory store (for tests).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").map_err(sqlx::Error::from)?;
        Self::connect(opts).await
    }

    async fn connect(opts: SqliteConnectOptions) -> Result<Self, StoreError> {
        // SQLite permits only limited write concurrency; a single
        // connection sidesteps lock contention entirely.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Upsert a record by its `(line_code, valid_for, day_type)` key.
    ///
    /// A single atomic statement: a later write fully replaces the earlier
    /// one and duplicate rows never accumulate.
    pub async fn upsert(&self, record: &ScheduleRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record.payload).map_err(|e| StoreError::Corrupt {
            line_code: record.line_code.clone(),
            message: format!("payload serialization: {e}"),
        })?;

        sqlx::query(
            "INSERT INTO bus_schedule_cache \
             (line_code, valid_for, day_type, payload, source_status, error_message, fetched_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(line_code, valid_for, day_type) DO UPDATE SET \
             payload = excluded.payload, \
             source_status = excluded.source_status, \
             error_message = excluded.error_message, \
             fetched_at = excluded.fetched_at",
        )
        .bind(&record.line_code)
        .bind(record.valid_for)
        .bind(record.day_type.as_str())
        .bind(payload)
        .bind(record.source_status.as_str())
        .bind(&record.error_message)
        .bind(record.fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a servable record for a line and date.
    ///
    /// Returns the newest SUCCESS row whose `valid_for` lies within
    /// `[for_date - max_stale_days, for_date]` and whose day type matches
    /// `for_date` (a Saturday is never served a weekday variant). The
    /// returned record has its `stale` flag set when `valid_for` is in
    /// the past. FAILED rows are never served; they exist for
    /// observability only.
    pub async fn find_fresh_or_stale(
        &self,
        line_code: &str,
        for_date: NaiveDate,
        max_stale_days: u32,
    ) -> Result<Option<ScheduleRecord>, StoreError> {
        let day_type = DayType::for_date(for_date);
        let oldest = for_date - chrono::Duration::days(max_stale_days as i64);

        let row: Option<ScheduleRow> = sqlx::query_as(
            "SELECT line_code, valid_for, day_type, payload, source_status, error_message, fetched_at \
             FROM bus_schedule_cache \
             WHERE line_code = ? AND day_type = ? AND source_status = 'SUCCESS' \
               AND valid_for >= ? AND valid_for <= ? \
             ORDER BY valid_for DESC LIMIT 1",
        )
        .bind(line_code)
        .bind(day_type.as_str())
        .bind(oldest)
        .bind(for_date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let mut record = row.into_record()?;
                record.stale = record.valid_for < for_date;
                Ok(Some(record))
            }
        }
    }

    /// Delete rows for one line, or every row when no line is given.
    /// Returns the number of rows removed.
    pub async fn delete(&self, line_code: Option<&str>) -> Result<u64, StoreError> {
        let result = match line_code {
            Some(code) => {
                sqlx::query("DELETE FROM bus_schedule_cache WHERE line_code = ?")
                    .bind(code)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM bus_schedule_cache")
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    /// Row counts for one `(date, day_type)` slice, for the admin surface.
    pub async fn stats(&self, date: NaiveDate) -> Result<PersistentStats, StoreError> {
        let day_type = DayType::for_date(date);

        let rows_total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bus_schedule_cache WHERE valid_for = ? AND day_type = ?",
        )
        .bind(date)
        .bind(day_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        let rows_success: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bus_schedule_cache \
             WHERE valid_for = ? AND day_type = ? AND source_status = 'SUCCESS'",
        )
        .bind(date)
        .bind(day_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(PersistentStats {
            date,
            day_type: day_type.as_str().to_string(),
            rows_total,
            rows_success,
        })
    }

    /// Total row count across all keys (test helper).
    pub async fn count_all(&self) -> Result<i64, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM bus_schedule_cache")
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataStatus, TimeOfDay};

    fn payload_with_times(hours: &[u32]) -> SchedulePayload {
        let mut payload = SchedulePayload::empty(DataStatus::Ok, true);
        payload.outbound = hours
            .iter()
            .map(|h| TimeOfDay::new(*h, 0).unwrap())
            .collect();
        payload
    }

    fn weekday() -> NaiveDate {
        // 2025-06-04 is a Wednesday
        NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_key() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let date = weekday();

        let record =
            ScheduleRecord::success("42", date, DayType::Weekday, payload_with_times(&[6, 7]));
        store.upsert(&record).await.unwrap();
        store.upsert(&record).await.unwrap();

        assert_eq!(store.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn later_write_replaces_earlier() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let date = weekday();

        let first =
            ScheduleRecord::success("42", date, DayType::Weekday, payload_with_times(&[6]));
        store.upsert(&first).await.unwrap();

        let second =
            ScheduleRecord::success("42", date, DayType::Weekday, payload_with_times(&[6, 7, 8]));
        store.upsert(&second).await.unwrap();

        let found = store
            .find_fresh_or_stale("42", date, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.payload.outbound.len(), 3);
        assert_eq!(store.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_row_within_tolerance_is_served_and_flagged() {
        let store = ScheduleStore::in_memory().await.unwrap();
        // Wednesday record, queried on Thursday (same day type).
        let wednesday = weekday();
        let thursday = wednesday + chrono::Duration::days(1);

        let record =
            ScheduleRecord::success("42", wednesday, DayType::Weekday, payload_with_times(&[6]));
        store.upsert(&record).await.unwrap();

        let found = store
            .find_fresh_or_stale("42", thursday, 2)
            .await
            .unwrap()
            .unwrap();
        assert!(found.stale);
        assert_eq!(found.valid_for, wednesday);

        // Outside tolerance nothing is served.
        assert!(
            store
                .find_fresh_or_stale("42", thursday + chrono::Duration::days(7), 2)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn day_type_must_match() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let friday = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();

        let record =
            ScheduleRecord::success("42", friday, DayType::Weekday, payload_with_times(&[6]));
        store.upsert(&record).await.unwrap();

        // Friday's weekday variant must not satisfy a Saturday query.
        assert!(
            store
                .find_fresh_or_stale("42", saturday, 5)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn failed_rows_are_not_served() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let date = weekday();

        let record = ScheduleRecord::failed("42", date, DayType::Weekday, "timeout");
        store.upsert(&record).await.unwrap();

        assert!(
            store
                .find_fresh_or_stale("42", date, 2)
                .await
                .unwrap()
                .is_none()
        );
        // Still persisted for observability.
        assert_eq!(store.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_by_line_and_wholesale() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let date = weekday();

        for code in ["42", "42", "99"] {
            let record =
                ScheduleRecord::success(code, date, DayType::Weekday, payload_with_times(&[6]));
            store.upsert(&record).await.unwrap();
        }
        assert_eq!(store.count_all().await.unwrap(), 2);

        assert_eq!(store.delete(Some("42")).await.unwrap(), 1);
        assert_eq!(store.count_all().await.unwrap(), 1);

        assert_eq!(store.delete(None).await.unwrap(), 1);
        assert_eq!(store.count_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stats_counts_by_day_slice() {
        let store = ScheduleStore::in_memory().await.unwrap();
        let date = weekday();

        let ok = ScheduleRecord::success("42", date, DayType::Weekday, payload_with_times(&[6]));
        let failed = ScheduleRecord::failed("99", date, DayType::Weekday, "boom");
        store.upsert(&ok).await.unwrap();
        store.upsert(&failed).await.unwrap();

        let stats = store.stats(date).await.unwrap();
        assert_eq!(stats.rows_total, 2);
        assert_eq!(stats.rows_success, 1);
        assert_eq!(stats.day_type, "WEEKDAY");
    }

    #[tokio::test]
    async fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedules.db");
        let date = weekday();

        {
            let store = ScheduleStore::open(&path).await.unwrap();
            let record =
                ScheduleRecord::success("42", date, DayType::Weekday, payload_with_times(&[6]));
            store.upsert(&record).await.unwrap();
        }

        let store = ScheduleStore::open(&path).await.unwrap();
        let found = store
            .find_fresh_or_stale("42", date, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.line_code, "42");
        assert!(!found.stale);
    }
}
