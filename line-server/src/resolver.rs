//! Schedule resolution: memory cache, persistent store, upstream fetch.
//!
//! `get_schedule` never fails for upstream reasons. The resolution order
//! is: memory cache, then persistent store (including stale-but-tolerated
//! rows, preferred over refetching to keep upstream load down), then one
//! coalesced upstream fetch. Every outcome, including failure, produces a
//! `ScheduleRecord`; a FAILED sentinel is distinguishable downstream from
//! a genuine no-service day via its `source_status` and `data_status`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::cache::{MemoryCache, MemoryCacheConfig, MemoryCacheStats};
use crate::domain::{DayType, ScheduleRecord};
use crate::store::{PersistentStats, ScheduleStore, StoreError};
use crate::upstream::{ScheduleProvider, UpstreamError, build_payload};

/// Cache key: one record per line per calendar date.
type Key = (String, NaiveDate);

/// Configuration for the schedule resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Memory-cache tier settings.
    pub memory: MemoryCacheConfig,

    /// How long a FAILED sentinel stays in memory. Kept short so a
    /// recovering upstream is retried quickly.
    pub failed_ttl: Duration,

    /// How many days past `valid_for` a persisted record may still be
    /// served.
    pub max_stale_days: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            memory: MemoryCacheConfig::default(),
            failed_ttl: Duration::from_secs(60),
            max_stale_days: 2,
        }
    }
}

/// Combined cache statistics for the admin surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheTierStats {
    pub memory: MemoryCacheStats,
    pub persistent: PersistentStats,
}

/// Resolves canonical schedules for concrete line codes.
pub struct ScheduleResolver {
    provider: Arc<dyn ScheduleProvider>,
    store: ScheduleStore,
    memory: MemoryCache<Key, Arc<ScheduleRecord>>,
    config: ResolverConfig,
}

impl ScheduleResolver {
    pub fn new(
        provider: Arc<dyn ScheduleProvider>,
        store: ScheduleStore,
        config: ResolverConfig,
    ) -> Self {
        let memory = MemoryCache::new(config.memory.clone());
        Self {
            provider,
            store,
            memory,
            config,
        }
    }

    /// Get the canonical schedule for a line on a date.
    ///
    /// Infallible with respect to the upstream: failures come back as a
    /// sentinel record with `source_status = Failed`. Concurrent calls for
    /// the same `(line_code, date)` coalesce onto a single resolution, so
    /// a burst of cache misses causes at most one upstream fetch per key.
    pub async fn get_schedule(&self, line_code: &str, for_date: NaiveDate) -> Arc<ScheduleRecord> {
        let key = (line_code.to_string(), for_date);
        self.memory
            .get_or_insert_with(key, self.resolve(line_code, for_date))
            .await
    }

    /// Resolution on memory-cache miss: store first, upstream second.
    /// Returns the record plus an optional TTL override for the memory
    /// entry (FAILED sentinels live shorter).
    async fn resolve(
        &self,
        line_code: &str,
        for_date: NaiveDate,
    ) -> (Arc<ScheduleRecord>, Option<Duration>) {
        match self
            .store
            .find_fresh_or_stale(line_code, for_date, self.config.max_stale_days)
            .await
        {
            Ok(Some(record)) => {
                if record.stale {
                    tracing::warn!(
                        line_code,
                        valid_for = %record.valid_for,
                        %for_date,
                        "serving stale schedule within tolerance window"
                    );
                }
                return (Arc::new(record), None);
            }
            Ok(None) => {}
            Err(e) => {
                // A broken store must not block resolution; fall through
                // to the upstream.
                tracing::error!(line_code, error = %e, "persistent store lookup failed");
            }
        }

        tracing::info!(line_code, %for_date, "fetching schedule from upstream");
        let day_type = DayType::for_date(for_date);

        let record = match self.fetch_upstream(line_code, day_type, for_date).await {
            Ok(record) => {
                self.persist(&record).await;
                (Arc::new(record), None)
            }
            Err(e) => {
                tracing::error!(line_code, error = %e, "upstream schedule fetch failed");
                let sentinel =
                    ScheduleRecord::failed(line_code, for_date, day_type, e.to_string());
                // Persisted too, for observability.
                self.persist(&sentinel).await;
                (Arc::new(sentinel), Some(self.config.failed_ttl))
            }
        };

        record
    }

    async fn fetch_upstream(
        &self,
        line_code: &str,
        day_type: DayType,
        for_date: NaiveDate,
    ) -> Result<ScheduleRecord, UpstreamError> {
        let rows = self.provider.fetch_schedule(line_code).await?;

        // An entirely empty response is indistinguishable from a broken
        // one; only per-day-type emptiness counts as a no-service day.
        if rows.is_empty() {
            return Err(UpstreamError::EmptyPayload);
        }

        let payload = build_payload(&rows, day_type);
        Ok(ScheduleRecord::success(line_code, for_date, day_type, payload))
    }

    /// Upsert with log-and-swallow semantics: a persistence failure costs
    /// durability, never the request.
    async fn persist(&self, record: &ScheduleRecord) {
        if let Err(e) = self.store.upsert(record).await {
            tracing::warn!(
                line_code = %record.line_code,
                error = %e,
                "failed to persist schedule record"
            );
        }
    }

    /// Clear cached schedules for one line (today's entry plus its store
    /// rows) or for everything.
    pub async fn clear_cache(&self, line_code: Option<&str>, today: NaiveDate) {
        match line_code {
            Some(code) => {
                self.memory.remove(&(code.to_string(), today)).await;
            }
            None => self.memory.clear(),
        }

        match self.store.delete(line_code).await {
            Ok(deleted) => {
                tracing::info!(line_code = ?line_code, deleted, "cleared schedule store rows");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to clear schedule store rows");
            }
        }
    }

    /// Statistics for both tiers, for the admin surface.
    pub async fn cache_stats(&self, today: NaiveDate) -> Result<CacheTierStats, StoreError> {
        Ok(CacheTierStats {
            memory: self.memory.stats().await,
            persistent: self.store.stats(today).await?,
        })
    }
}
