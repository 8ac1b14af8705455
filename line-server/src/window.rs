//! Service-window computation.
//!
//! Derives the hours during which a line operates, either from the rail
//! topology's fixed first/last times (which may wrap past midnight) or
//! from a resolved schedule's departure times.
//!
//! The policy for missing data is deliberate and asymmetric:
//! - a failed fetch is *inconclusive*: the window is unknown
//!   (`None`) and callers treat every hour as potentially in service;
//! - a genuine no-service day (or a direction with no departures while
//!   the line otherwise runs) is a definite `has_service = false`.
//! Conflating the two would mark lines out of service whenever the
//! upstream has a bad day.

use crate::domain::{DataStatus, Direction, ScheduleRecord, TimeOfDay};
use crate::topology::TopologyEntry;

/// The hours during which a line is in service on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceWindow {
    /// Hour of first departure. `None` only when `has_service` is false.
    pub first_hour: Option<u32>,

    /// Hour of last departure. `None` only when `has_service` is false.
    pub last_hour: Option<u32>,

    /// Whether the window crosses midnight (topology-managed lines only;
    /// schedule-derived windows are always same-day).
    pub wraps_midnight: bool,

    /// Whether the line plans any trips at all for the day.
    pub has_service: bool,

    /// The exact first departure, for "next service at" messages.
    pub first_departure: Option<TimeOfDay>,
}

impl ServiceWindow {
    /// A window for a line with no planned trips.
    pub fn no_service() -> Self {
        Self {
            first_hour: None,
            last_hour: None,
            wraps_midnight: false,
            has_service: false,
            first_departure: None,
        }
    }
}

/// Front door: topology hours win when the line is topology-managed,
/// otherwise the window is derived from the resolved schedule. With
/// neither available the window is inconclusive.
pub fn compute_window(
    entry: Option<&TopologyEntry>,
    schedule: Option<&ScheduleRecord>,
    direction: Option<Direction>,
) -> Option<ServiceWindow> {
    match entry {
        Some(entry) => Some(window_from_topology(entry)),
        None => schedule.and_then(|record| window_from_schedule(record, direction)),
    }
}

/// Window from fixed topology hours (rail lines).
pub fn window_from_topology(entry: &TopologyEntry) -> ServiceWindow {
    ServiceWindow {
        first_hour: Some(entry.first_time.hour()),
        last_hour: Some(entry.last_time.hour()),
        wraps_midnight: entry.wraps_midnight(),
        has_service: true,
        first_departure: Some(entry.first_time),
    }
}

/// Window from a resolved schedule.
///
/// `direction` limits the computation to one direction; with `None`, both
/// directions contribute. Returns `None` when the schedule data is
/// inconclusive (fetch failed or status unknown) - the benefit-of-the-doubt
/// case.
pub fn window_from_schedule(
    record: &ScheduleRecord,
    direction: Option<Direction>,
) -> Option<ServiceWindow> {
    let payload = &record.payload;

    let directions: &[Direction] = match direction {
        Some(d) => match d {
            Direction::Outbound => &[Direction::Outbound],
            Direction::Inbound => &[Direction::Inbound],
        },
        None => &Direction::ALL,
    };

    let mut first: Option<TimeOfDay> = None;
    let mut last: Option<TimeOfDay> = None;
    for d in directions {
        for t in payload.times(*d) {
            first = Some(first.map_or(*t, |f| f.min(*t)));
            last = Some(last.map_or(*t, |l| l.max(*t)));
        }
    }

    match (first, last) {
        (Some(first), Some(last)) => Some(ServiceWindow {
            first_hour: Some(first.hour()),
            last_hour: Some(last.hour()),
            // Directly observed schedules are same-day by construction.
            wraps_midnight: false,
            has_service: true,
            first_departure: Some(first),
        }),
        _ => empty_schedule_window(record, direction),
    }
}

/// Decide what an empty time list means.
fn empty_schedule_window(
    record: &ScheduleRecord,
    direction: Option<Direction>,
) -> Option<ServiceWindow> {
    let payload = &record.payload;

    // Fetch failed: emptiness means nothing, window unknown.
    if payload.data_status == DataStatus::FetchFailed {
        tracing::warn!(
            line_code = %record.line_code,
            "schedule unavailable, treating service window as inconclusive"
        );
        return None;
    }

    // A specific direction with no departures, while the opposite one runs
    // (or the line has service today at all), is out of service for that
    // direction specifically.
    if let Some(d) = direction {
        let opposite_has_times = !payload.times(d.opposite()).is_empty();
        if opposite_has_times || payload.has_service_today {
            return Some(ServiceWindow::no_service());
        }
    }

    // A genuine no-service day.
    if payload.data_status == DataStatus::NoServiceDay
        || (payload.data_status == DataStatus::NoData && !payload.has_service_today)
    {
        return Some(ServiceWindow::no_service());
    }

    // Anything else is unknown; give the benefit of the doubt.
    None
}

/// Whether an hour of day falls inside a service window.
///
/// An absent window means "unknown" and reads as in service. A wrapping
/// window covers `[first..23]` plus `[0..last]`.
pub fn is_hour_in_service(hour: u32, window: Option<&ServiceWindow>) -> bool {
    let Some(window) = window else {
        return true;
    };

    if !window.has_service {
        return false;
    }

    let (Some(first), Some(last)) = (window.first_hour, window.last_hour) else {
        return false;
    };

    if !window.wraps_midnight {
        first <= hour && hour <= last
    } else {
        hour >= first || hour <= last
    }
}
