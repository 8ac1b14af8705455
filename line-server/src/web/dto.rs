//! Data transfer objects for web requests and responses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Direction, SchedulePayload, ScheduleRecord};
use crate::status::LineStatus;

/// Query parameters for the status endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Direction code ("G" or "D"); both directions when absent
    pub direction: Option<String>,
}

/// Query parameters for the admin cache-clear endpoints.
#[derive(Debug, Deserialize)]
pub struct ClearCacheQuery {
    /// Restrict the clear to one line; everything when absent
    pub line_code: Option<String>,
}

/// A schedule in responses.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    /// The requested line code (pool code for virtual lines)
    pub line_code: String,

    /// Calendar date the schedule is valid for
    pub date: NaiveDate,

    /// Day type the times belong to
    pub day_type: &'static str,

    /// Departure times and route metadata
    pub schedule: SchedulePayload,

    /// Whether the backing fetch succeeded
    pub source_status: &'static str,

    /// Upstream error text for FAILED records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the backing fetch happened
    pub fetched_at: DateTime<Utc>,

    /// Set when a past date's record was served under staleness tolerance
    pub stale: bool,
}

impl From<&ScheduleRecord> for ScheduleResponse {
    fn from(record: &ScheduleRecord) -> Self {
        Self {
            line_code: record.line_code.clone(),
            date: record.valid_for,
            day_type: record.day_type.as_str(),
            schedule: record.payload.clone(),
            source_status: record.source_status.as_str(),
            error_message: record.error_message.clone(),
            fetched_at: record.fetched_at,
            stale: record.stale,
        }
    }
}

/// A line status in responses.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub line_code: String,

    /// Echo of the requested direction filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,

    #[serde(flatten)]
    pub status: LineStatus,
}

/// Confirmation body for admin mutations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataStatus, DayType, TimeOfDay};
    use crate::status::OperationalStatus;

    #[test]
    fn schedule_response_from_record() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let mut payload = SchedulePayload::empty(DataStatus::Ok, true);
        payload.outbound.push(TimeOfDay::new(6, 0).unwrap());
        let record = ScheduleRecord::success("42", date, DayType::Weekday, payload);

        let response = ScheduleResponse::from(&record);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["line_code"], "42");
        assert_eq!(json["day_type"], "WEEKDAY");
        assert_eq!(json["source_status"], "SUCCESS");
        assert_eq!(json["schedule"]["G"][0], "06:00");
        assert_eq!(json["schedule"]["data_status"], "OK");
        assert_eq!(json["stale"], false);
        // Absent for successful records
        assert!(json.get("error_message").is_none());
    }

    #[test]
    fn failed_schedule_response_carries_error() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let record = ScheduleRecord::failed("42", date, DayType::Weekday, "timeout");

        let json = serde_json::to_value(ScheduleResponse::from(&record)).unwrap();
        assert_eq!(json["source_status"], "FAILED");
        assert_eq!(json["error_message"], "timeout");
        assert_eq!(json["schedule"]["data_status"], "FETCH_FAILED");
    }

    #[test]
    fn status_response_flattens_status_fields() {
        let response = StatusResponse {
            line_code: "19".into(),
            direction: Some(Direction::Outbound),
            status: LineStatus {
                status: OperationalStatus::OutOfService,
                messages: Vec::new(),
                next_service_time: Some(TimeOfDay::new(6, 20).unwrap()),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["line_code"], "19");
        assert_eq!(json["direction"], "G");
        assert_eq!(json["status"], "OUT_OF_SERVICE");
        assert_eq!(json["next_service_time"], "06:20");
    }
}
