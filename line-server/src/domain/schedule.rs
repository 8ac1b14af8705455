//! Canonical schedule types.
//!
//! A [`ScheduleRecord`] is one upstream fetch outcome for one line on one
//! calendar date. Records are uniquely identified by
//! `(line_code, valid_for, day_type)` and later writes for the same key
//! replace earlier ones in the persistent store.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::day_type::DayType;
use super::direction::Direction;
use super::time::TimeOfDay;

/// Whether an upstream fetch produced usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Success,
    Failed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Success => "SUCCESS",
            SourceStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(SourceStatus::Success),
            "FAILED" => Some(SourceStatus::Failed),
            _ => None,
        }
    }
}

/// Data quality of a canonical payload.
///
/// This is the flag downstream consumers use to distinguish "the line
/// genuinely has no service today" from "we could not find out". It is a
/// closed set; free-form status strings never appear in payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataStatus {
    /// Times were fetched and at least one direction has departures.
    #[serde(rename = "OK")]
    Ok,
    /// The fetch succeeded but the day type has no planned departures.
    #[serde(rename = "NO_SERVICE_DAY")]
    NoServiceDay,
    /// The upstream fetch failed; emptiness of the payload means nothing.
    #[serde(rename = "FETCH_FAILED")]
    FetchFailed,
    /// Rows existed for the day type but none yielded a usable time.
    #[serde(rename = "NO_DATA")]
    NoData,
}

/// Start and end stop names for one direction, split out of the
/// human-readable route string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteEnds {
    pub start: String,
    pub end: String,
}

impl RouteEnds {
    /// Split a route string like `"HARBOUR - CENTRAL"` on the first
    /// `" - "` separator. Unparseable strings yield empty stop names.
    pub fn from_route_name(route_name: &str) -> Self {
        match route_name.split_once(" - ") {
            Some((start, end)) if !start.trim().is_empty() && !end.trim().is_empty() => Self {
                start: start.trim().to_string(),
                end: end.trim().to_string(),
            },
            _ => Self::default(),
        }
    }
}

/// The canonical schedule payload served to callers.
///
/// Times are sorted ascending and deduplicated per direction. Because
/// [`TimeOfDay`] renders zero-padded `HH:MM`, the serialized string lists
/// are also in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePayload {
    /// Outbound departure times.
    #[serde(rename = "G")]
    pub outbound: Vec<TimeOfDay>,

    /// Inbound departure times.
    #[serde(rename = "D")]
    pub inbound: Vec<TimeOfDay>,

    /// Per-direction route endpoints, keyed by direction code.
    #[serde(default)]
    pub meta: BTreeMap<Direction, RouteEnds>,

    pub has_service_today: bool,

    pub data_status: DataStatus,
}

impl SchedulePayload {
    /// An empty payload with the given status flags.
    pub fn empty(data_status: DataStatus, has_service_today: bool) -> Self {
        Self {
            outbound: Vec::new(),
            inbound: Vec::new(),
            meta: BTreeMap::new(),
            has_service_today,
            data_status,
        }
    }

    /// The sentinel payload for a failed upstream fetch.
    ///
    /// `has_service_today` stays `true`: a fetch failure is a data problem,
    /// not evidence of a no-service day.
    pub fn fetch_failed() -> Self {
        Self::empty(DataStatus::FetchFailed, true)
    }

    /// Departure times for one direction.
    pub fn times(&self, direction: Direction) -> &[TimeOfDay] {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    /// Mutable departure times for one direction.
    pub fn times_mut(&mut self, direction: Direction) -> &mut Vec<TimeOfDay> {
        match direction {
            Direction::Outbound => &mut self.outbound,
            Direction::Inbound => &mut self.inbound,
        }
    }

    /// Whether any direction has at least one departure.
    pub fn has_any_times(&self) -> bool {
        !self.outbound.is_empty() || !self.inbound.is_empty()
    }

    /// Number of departures per hour of day for one direction.
    pub fn trips_per_hour(&self, direction: Direction) -> [u32; 24] {
        let mut counts = [0u32; 24];
        for t in self.times(direction) {
            counts[t.hour() as usize] += 1;
        }
        counts
    }

    /// Number of departures per hour of day, both directions combined.
    pub fn trips_per_hour_combined(&self) -> [u32; 24] {
        let mut counts = self.trips_per_hour(Direction::Outbound);
        for (total, n) in counts
            .iter_mut()
            .zip(self.trips_per_hour(Direction::Inbound))
        {
            *total += n;
        }
        counts
    }
}

/// One upstream fetch outcome for one line on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub line_code: String,
    pub valid_for: NaiveDate,
    pub day_type: DayType,
    pub payload: SchedulePayload,
    pub source_status: SourceStatus,
    pub error_message: Option<String>,
    pub fetched_at: DateTime<Utc>,

    /// Advisory: the record was served past its `valid_for` date under the
    /// staleness-tolerance policy. Never persisted.
    pub stale: bool,
}

impl ScheduleRecord {
    /// A freshly fetched successful record.
    pub fn success(
        line_code: impl Into<String>,
        valid_for: NaiveDate,
        day_type: DayType,
        payload: SchedulePayload,
    ) -> Self {
        Self {
            line_code: line_code.into(),
            valid_for,
            day_type,
            payload,
            source_status: SourceStatus::Success,
            error_message: None,
            fetched_at: Utc::now(),
            stale: false,
        }
    }

    /// The sentinel record for a failed upstream fetch.
    pub fn failed(
        line_code: impl Into<String>,
        valid_for: NaiveDate,
        day_type: DayType,
        error: impl Into<String>,
    ) -> Self {
        let mut message: String = error.into();
        // Bound the persisted message; upstream bodies can be large.
        message.truncate(1000);
        Self {
            line_code: line_code.into(),
            valid_for,
            day_type,
            payload: SchedulePayload::fetch_failed(),
            source_status: SourceStatus::Failed,
            error_message: Some(message),
            fetched_at: Utc::now(),
            stale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_ends_splitting() {
        let ends = RouteEnds::from_route_name("HARBOUR - CENTRAL STATION");
        assert_eq!(ends.start, "HARBOUR");
        assert_eq!(ends.end, "CENTRAL STATION");

        // Only the first separator splits
        let ends = RouteEnds::from_route_name("A - B - C");
        assert_eq!(ends.start, "A");
        assert_eq!(ends.end, "B - C");

        assert_eq!(RouteEnds::from_route_name("NO SEPARATOR"), RouteEnds::default());
        assert_eq!(RouteEnds::from_route_name(""), RouteEnds::default());
        assert_eq!(RouteEnds::from_route_name(" - "), RouteEnds::default());
    }

    #[test]
    fn payload_serializes_with_wire_names() {
        let mut payload = SchedulePayload::empty(DataStatus::Ok, true);
        payload.outbound.push(TimeOfDay::new(6, 0).unwrap());
        payload
            .meta
            .insert(Direction::Outbound, RouteEnds::from_route_name("A - B"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["G"][0], "06:00");
        assert_eq!(json["data_status"], "OK");
        assert_eq!(json["meta"]["G"]["start"], "A");

        let back: SchedulePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn fetch_failed_payload_keeps_benefit_of_doubt() {
        let payload = SchedulePayload::fetch_failed();
        assert!(payload.has_service_today);
        assert_eq!(payload.data_status, DataStatus::FetchFailed);
        assert!(!payload.has_any_times());
    }

    #[test]
    fn trips_per_hour_counts_by_hour() {
        let mut payload = SchedulePayload::empty(DataStatus::Ok, true);
        payload.outbound = vec![
            TimeOfDay::new(6, 0).unwrap(),
            TimeOfDay::new(6, 30).unwrap(),
            TimeOfDay::new(7, 0).unwrap(),
        ];
        payload.inbound = vec![TimeOfDay::new(6, 15).unwrap()];

        let counts = payload.trips_per_hour(Direction::Outbound);
        assert_eq!(counts[6], 2);
        assert_eq!(counts[7], 1);

        let combined = payload.trips_per_hour_combined();
        assert_eq!(combined[6], 3);
        assert_eq!(combined[7], 1);
        assert_eq!(combined[8], 0);
    }

    #[test]
    fn failed_record_truncates_long_errors() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let record = ScheduleRecord::failed("42", date, DayType::Weekday, "x".repeat(5000));
        assert_eq!(record.error_message.as_ref().unwrap().len(), 1000);
        assert_eq!(record.source_status, SourceStatus::Failed);
    }
}
