//! Line status resolution.
//!
//! Combines live disruption alerts with computed operating hours into a
//! single user-facing status, evaluated in strict priority order:
//!
//! 1. WARNING - any active alert for the line in the last 24 hours;
//! 2. OUT_OF_SERVICE - no alerts and the current hour is outside the
//!    service window;
//! 3. ACTIVE - everything else, including inconclusive window data.
//!
//! Failure never escalates: a broken alerts provider reads as "no
//! alerts", and a failed operating-hours computation defaults to ACTIVE.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::cache::{MemoryCache, MemoryCacheConfig, MemoryCacheStats};
use crate::domain::{Direction, TimeOfDay};
use crate::pool::LinePoolAggregator;
use crate::resolver::ScheduleResolver;
use crate::topology::RailTopology;
use crate::window::{compute_window, is_hour_in_service};

/// User-facing operational status of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationalStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "OUT_OF_SERVICE")]
    OutOfService,
}

/// The resolved status for one line (and optionally one direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStatus {
    pub status: OperationalStatus,

    /// Alert texts when `status` is WARNING; empty otherwise.
    pub messages: Vec<String>,

    /// First departure to wait for when OUT_OF_SERVICE (next day's first
    /// departure when the current time is past closing).
    pub next_service_time: Option<TimeOfDay>,
}

impl LineStatus {
    fn active() -> Self {
        Self {
            status: OperationalStatus::Active,
            messages: Vec::new(),
            next_service_time: None,
        }
    }
}

/// Configuration for the status resolver.
#[derive(Debug, Clone)]
pub struct StatusConfig {
    /// Status cache settings (short TTL; status is cheap to recompute but
    /// each recomputation may hit the alerts provider).
    pub cache: MemoryCacheConfig,

    /// How far back an alert's update time may lie and still count.
    pub alert_window_hours: i64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            cache: MemoryCacheConfig::new(std::time::Duration::from_secs(300), 500),
            alert_window_hours: 24,
        }
    }
}

type StatusKey = (String, Option<Direction>);

/// Resolves the user-facing status of a line.
pub struct StatusResolver {
    alerts: Arc<dyn crate::upstream::AlertProvider>,
    schedules: Arc<ScheduleResolver>,
    pool: Arc<LinePoolAggregator>,
    topology: Arc<RailTopology>,
    cache: MemoryCache<StatusKey, LineStatus>,
    config: StatusConfig,
}

impl StatusResolver {
    pub fn new(
        alerts: Arc<dyn crate::upstream::AlertProvider>,
        schedules: Arc<ScheduleResolver>,
        pool: Arc<LinePoolAggregator>,
        topology: Arc<RailTopology>,
        config: StatusConfig,
    ) -> Self {
        let cache = MemoryCache::new(config.cache.clone());
        Self {
            alerts,
            schedules,
            pool,
            topology,
            cache,
            config,
        }
    }

    /// Get the current status of a line, cached for a few minutes.
    pub async fn get_status(&self, line_code: &str, direction: Option<Direction>) -> LineStatus {
        let key = (line_code.to_uppercase(), direction);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(line_code, "status cache hit");
            return cached;
        }

        let now = Local::now();
        let status = self
            .evaluate(
                line_code,
                direction,
                now.with_timezone(&Utc),
                now.time().hour(),
                now.date_naive(),
            )
            .await;

        self.cache.insert(key, status.clone()).await;
        status
    }

    /// Status evaluation against an explicit clock. Uncached.
    pub async fn get_status_at(
        &self,
        line_code: &str,
        direction: Option<Direction>,
        now: DateTime<Utc>,
        current_hour: u32,
        today: NaiveDate,
    ) -> LineStatus {
        self.evaluate(line_code, direction, now, current_hour, today)
            .await
    }

    async fn evaluate(
        &self,
        line_code: &str,
        direction: Option<Direction>,
        now: DateTime<Utc>,
        current_hour: u32,
        today: NaiveDate,
    ) -> LineStatus {
        // Step 1: disruption alerts beat everything.
        let messages = self.active_alerts(line_code, now).await;
        if !messages.is_empty() {
            return LineStatus {
                status: OperationalStatus::Warning,
                messages,
                next_service_time: None,
            };
        }

        // Step 2: operating hours. Topology-managed lines use their fixed
        // hours and skip the schedule fetch entirely; everything else
        // derives a window from the (pool-aware) resolved schedule.
        let entry = self.topology.get(line_code);
        let record = match entry {
            Some(_) => None,
            None if self.pool.pool().is_pool_code(line_code) => {
                Some(Arc::new(self.pool.get_pooled_schedule(today).await))
            }
            None => Some(self.schedules.get_schedule(line_code, today).await),
        };
        let window = compute_window(entry, record.as_deref(), direction);

        if !is_hour_in_service(current_hour, window.as_ref()) {
            // Either before the first departure or past the last one; in
            // both cases the next departure is the window's first.
            return LineStatus {
                status: OperationalStatus::OutOfService,
                messages: Vec::new(),
                next_service_time: window.and_then(|w| w.first_departure),
            };
        }

        // Step 3: all clear (including the inconclusive-window case).
        LineStatus::active()
    }

    /// Fetch alerts and filter to active ones for this line. A provider
    /// failure degrades to "no alerts".
    async fn active_alerts(&self, line_code: &str, now: DateTime<Utc>) -> Vec<String> {
        let alerts = match self.alerts.fetch_alerts(line_code).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(line_code, error = %e, "alerts fetch failed, assuming none");
                return Vec::new();
            }
        };

        let max_age = chrono::Duration::hours(self.config.alert_window_hours);
        alerts
            .into_iter()
            .filter(|a| {
                a.line_code.eq_ignore_ascii_case(line_code)
                    && !a.message.trim().is_empty()
                    && now.signed_duration_since(a.update_time) <= max_age
            })
            .map(|a| a.message)
            .collect()
    }

    /// Clear the status cache for one line (all direction variants) or
    /// for everything.
    pub async fn clear_cache(&self, line_code: Option<&str>) {
        match line_code {
            Some(code) => {
                let code = code.to_uppercase();
                for direction in [None, Some(Direction::Outbound), Some(Direction::Inbound)] {
                    self.cache.remove(&(code.clone(), direction)).await;
                }
                tracing::info!(line_code = %code, "cleared status cache for line");
            }
            None => {
                self.cache.clear();
                tracing::info!("cleared all status cache");
            }
        }
    }

    /// Status cache statistics for the admin surface.
    pub async fn cache_stats(&self) -> MemoryCacheStats {
        self.cache.stats().await
    }
}
