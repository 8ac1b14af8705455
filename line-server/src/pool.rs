//! Virtual-line pooling.
//!
//! Some user-facing lines have no upstream schedule of their own: they are
//! a brand over several physical line codes (the bus-rapid-transit corridor
//! runs as half a dozen numbered variants). This module merges the member
//! schedules into one aggregate and sums per-hour trip counts for capacity
//! arithmetic.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;

use crate::domain::{
    DataStatus, DayType, Direction, SchedulePayload, ScheduleRecord, SourceStatus,
};
use crate::resolver::ScheduleResolver;

/// Static configuration of one virtual line pool.
#[derive(Debug, Clone)]
pub struct LinePool {
    /// The user-facing pool code.
    pub pool_code: String,

    /// Physical member line codes, in aggregation order.
    pub members: Vec<String>,

    /// Fixed per-vehicle capacity for the pool. Member fleets are
    /// uniform, so this is configured rather than computed.
    pub vehicle_capacity: u32,

    /// Trip-count floor substituted when no member has schedule data,
    /// keeping capacity/occupancy arithmetic non-degenerate.
    pub min_trips_fallback: u32,
}

impl LinePool {
    pub fn new(
        pool_code: impl Into<String>,
        members: Vec<String>,
        vehicle_capacity: u32,
        min_trips_fallback: u32,
    ) -> Self {
        Self {
            pool_code: pool_code.into(),
            members,
            vehicle_capacity,
            min_trips_fallback,
        }
    }

    /// Whether a code is the pool's own user-facing code.
    pub fn is_pool_code(&self, line_code: &str) -> bool {
        line_code.eq_ignore_ascii_case(&self.pool_code)
    }

    /// Whether a code is one of the physical members.
    pub fn is_pool_member(&self, line_code: &str) -> bool {
        self.members.iter().any(|m| m.eq_ignore_ascii_case(line_code))
    }

    /// Capacity of `trips` vehicles in one hour, floored at 1 so
    /// occupancy division never hits zero.
    pub fn hourly_capacity(&self, trips: u32) -> u32 {
        (trips * self.vehicle_capacity).max(1)
    }
}

/// The default virtual line: the BRT corridor brand pooling its numbered
/// variants, with a fixed 193-passenger articulated-vehicle capacity.
pub fn default_brt_pool() -> LinePool {
    LinePool::new(
        "METROBUS",
        ["34", "34A", "34AS", "34BZ", "34C", "34G", "34Z"]
            .into_iter()
            .map(String::from)
            .collect(),
        193,
        6,
    )
}

/// Per-hour trip counts for a pooled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledTrips {
    /// Summed member trips per hour of day.
    pub per_hour: [u32; 24],

    /// Whether any member contributed real schedule data. When false,
    /// callers substitute the pool's `min_trips_fallback`.
    pub schedule_available: bool,
}

/// Merges member schedules into one virtual-line view.
pub struct LinePoolAggregator {
    pool: LinePool,
    resolver: Arc<ScheduleResolver>,
}

impl LinePoolAggregator {
    pub fn new(pool: LinePool, resolver: Arc<ScheduleResolver>) -> Self {
        Self { pool, resolver }
    }

    pub fn pool(&self) -> &LinePool {
        &self.pool
    }

    /// Whether a line code should be answered by this aggregator.
    pub fn is_pool_request(&self, line_code: &str) -> bool {
        self.pool.is_pool_code(line_code) || self.pool.is_pool_member(line_code)
    }

    /// The aggregate schedule for the virtual line on a date.
    ///
    /// Member times are unioned per direction, deduplicated and sorted.
    /// Route metadata is not meaningfully aggregable and is omitted. A
    /// failing member never sinks the aggregate; only when every member's
    /// fetch failed does the result carry `FetchFailed` (claiming "no
    /// planned service" while the upstream is down would conflate the two
    /// states the rest of the engine keeps apart).
    pub async fn get_pooled_schedule(&self, for_date: NaiveDate) -> ScheduleRecord {
        let records = self.member_records(for_date).await;

        let mut payload = SchedulePayload::empty(DataStatus::NoServiceDay, false);
        let mut all_failed = !records.is_empty();

        for record in &records {
            if record.source_status != SourceStatus::Failed {
                all_failed = false;
            }
            for direction in Direction::ALL {
                payload
                    .times_mut(direction)
                    .extend_from_slice(record.payload.times(direction));
            }
        }

        for direction in Direction::ALL {
            let times = payload.times_mut(direction);
            times.sort();
            times.dedup();
        }

        if payload.has_any_times() {
            payload.data_status = DataStatus::Ok;
            payload.has_service_today = true;
        } else if all_failed {
            payload = SchedulePayload::fetch_failed();
        }

        let mut record = ScheduleRecord::success(
            self.pool.pool_code.clone(),
            for_date,
            DayType::for_date(for_date),
            payload,
        );
        if record.payload.data_status == DataStatus::FetchFailed {
            record.source_status = SourceStatus::Failed;
        }
        record
    }

    /// Summed per-hour trip counts across members.
    ///
    /// Members whose fetch failed contribute nothing and do not count as
    /// schedule data.
    pub async fn pooled_trips_per_hour(
        &self,
        for_date: NaiveDate,
        direction: Option<Direction>,
    ) -> PooledTrips {
        let records = self.member_records(for_date).await;

        let mut per_hour = [0u32; 24];
        let mut schedule_available = false;

        for record in &records {
            if record.payload.data_status == DataStatus::FetchFailed {
                continue;
            }
            schedule_available = true;

            let counts = match direction {
                Some(d) => record.payload.trips_per_hour(d),
                None => record.payload.trips_per_hour_combined(),
            };
            for (total, n) in per_hour.iter_mut().zip(counts) {
                *total += n;
            }
        }

        PooledTrips {
            per_hour,
            schedule_available,
        }
    }

    async fn member_records(&self, for_date: NaiveDate) -> Vec<Arc<ScheduleRecord>> {
        join_all(
            self.pool
                .members
                .iter()
                .map(|member| self.resolver.get_schedule(member, for_date)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverConfig;
    use crate::store::ScheduleStore;
    use crate::upstream::{MockUpstream, RawScheduleRow};

    fn row(direction: &str, time: &str) -> RawScheduleRow {
        RawScheduleRow {
            route_name: String::new(),
            direction: direction.into(),
            time_string: time.into(),
            day_type: "I".into(),
        }
    }

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()
    }

    async fn aggregator_with(mock: &MockUpstream, members: &[&str]) -> LinePoolAggregator {
        let store = ScheduleStore::in_memory().await.unwrap();
        let resolver = Arc::new(ScheduleResolver::new(
            Arc::new(mock.clone()),
            store,
            ResolverConfig::default(),
        ));
        let pool = LinePool::new(
            "POOL",
            members.iter().map(|s| s.to_string()).collect(),
            193,
            6,
        );
        LinePoolAggregator::new(pool, resolver)
    }

    #[test]
    fn membership_checks() {
        let pool = default_brt_pool();
        assert!(pool.is_pool_code("METROBUS"));
        assert!(pool.is_pool_code("metrobus"));
        assert!(pool.is_pool_member("34AS"));
        assert!(pool.is_pool_member("34as"));
        assert!(!pool.is_pool_member("42"));
    }

    #[tokio::test]
    async fn union_dedupe_sort_across_members() {
        let mock = MockUpstream::new();
        mock.set_schedule("A", vec![row("G", "06:00"), row("G", "06:20")])
            .await;
        mock.set_schedule("B", vec![row("G", "06:10"), row("G", "06:20")])
            .await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let record = aggregator.get_pooled_schedule(wednesday()).await;
        let times: Vec<String> = record
            .payload
            .outbound
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(times, vec!["06:00", "06:10", "06:20"]);
        assert_eq!(record.payload.data_status, DataStatus::Ok);
        assert!(record.payload.has_service_today);
        assert!(record.payload.meta.is_empty());
        assert_eq!(record.line_code, "POOL");
    }

    #[tokio::test]
    async fn failing_member_does_not_sink_the_pool() {
        let mock = MockUpstream::new();
        mock.set_schedule("A", vec![row("G", "07:00")]).await;
        mock.fail_schedule("B", "down").await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let record = aggregator.get_pooled_schedule(wednesday()).await;
        assert_eq!(record.payload.data_status, DataStatus::Ok);
        assert_eq!(record.payload.outbound.len(), 1);
    }

    #[tokio::test]
    async fn all_members_failed_is_fetch_failed_not_no_service() {
        let mock = MockUpstream::new();
        mock.fail_schedule("A", "down").await;
        mock.fail_schedule("B", "down").await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let record = aggregator.get_pooled_schedule(wednesday()).await;
        assert_eq!(record.payload.data_status, DataStatus::FetchFailed);
        assert_eq!(record.source_status, SourceStatus::Failed);
        assert!(record.payload.has_service_today);
    }

    #[tokio::test]
    async fn no_member_service_is_no_service_day() {
        let mock = MockUpstream::new();
        // Rows exist but only for Saturdays; a Wednesday query finds none.
        let saturday_only = RawScheduleRow {
            route_name: String::new(),
            direction: "G".into(),
            time_string: "09:00".into(),
            day_type: "C".into(),
        };
        mock.set_schedule("A", vec![saturday_only.clone()]).await;
        mock.set_schedule("B", vec![saturday_only]).await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let record = aggregator.get_pooled_schedule(wednesday()).await;
        assert_eq!(record.payload.data_status, DataStatus::NoServiceDay);
        assert!(!record.payload.has_service_today);
    }

    #[tokio::test]
    async fn trips_per_hour_sums_members() {
        let mock = MockUpstream::new();
        mock.set_schedule("A", vec![row("G", "06:00"), row("G", "06:30"), row("D", "06:45")])
            .await;
        mock.set_schedule("B", vec![row("G", "06:10")]).await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let trips = aggregator.pooled_trips_per_hour(wednesday(), None).await;
        assert!(trips.schedule_available);
        assert_eq!(trips.per_hour[6], 4);
        assert_eq!(trips.per_hour[7], 0);

        let outbound_only = aggregator
            .pooled_trips_per_hour(wednesday(), Some(Direction::Outbound))
            .await;
        assert_eq!(outbound_only.per_hour[6], 3);
    }

    #[tokio::test]
    async fn unavailable_schedules_signal_fallback_floor() {
        let mock = MockUpstream::new();
        mock.fail_schedule("A", "down").await;
        mock.fail_schedule("B", "down").await;
        let aggregator = aggregator_with(&mock, &["A", "B"]).await;

        let trips = aggregator.pooled_trips_per_hour(wednesday(), None).await;
        assert!(!trips.schedule_available);
        assert_eq!(trips.per_hour, [0u32; 24]);

        // Callers substitute the floor so capacity never degenerates.
        let pool = aggregator.pool();
        assert_eq!(pool.hourly_capacity(pool.min_trips_fallback), 6 * 193);
        assert_eq!(pool.hourly_capacity(0), 1);
    }
}
