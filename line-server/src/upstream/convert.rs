//! Conversion from raw provider rows to the canonical payload.

use crate::domain::{
    DataStatus, DayType, Direction, RouteEnds, SchedulePayload, TimeOfDay,
};

use super::types::RawScheduleRow;

/// Build the canonical payload for one day type from raw provider rows.
///
/// Rows for other day types are ignored; rows with unknown direction codes
/// or unparseable times are skipped (the provider gives no well-formedness
/// guarantees and one bad row must not sink the batch). Times are sorted
/// ascending and deduplicated per direction.
///
/// Callers are expected to have already rejected an entirely empty row
/// list as a fetch failure; this function only decides between `Ok`,
/// `NoServiceDay` and `NoData`.
pub fn build_payload(rows: &[RawScheduleRow], day_type: DayType) -> SchedulePayload {
    let mut payload = SchedulePayload::empty(DataStatus::NoServiceDay, false);
    let mut saw_day_type_row = false;

    for row in rows {
        if !day_type.matches_provider_code(&row.day_type) {
            continue;
        }
        saw_day_type_row = true;

        let Some(direction) = Direction::parse(&row.direction) else {
            tracing::warn!(direction = %row.direction, "skipping row with unknown direction code");
            continue;
        };

        // Route metadata: first parseable route string per direction wins.
        if !payload.meta.contains_key(&direction) {
            let ends = RouteEnds::from_route_name(&row.route_name);
            if ends != RouteEnds::default() {
                payload.meta.insert(direction, ends);
            }
        }

        if let Some(time) = TimeOfDay::parse_lenient(&row.time_string) {
            payload.times_mut(direction).push(time);
        } else {
            tracing::warn!(time = %row.time_string, "skipping row with malformed time");
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
    } else if saw_day_type_row {
        // Rows existed for this day type but none produced a time.
        payload.data_status = DataStatus::NoData;
        payload.has_service_today = false;
    }
    // else: rows exist only for other day types -> NoServiceDay (the default).

    payload
}
