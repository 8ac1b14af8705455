//! Domain value types shared across the resolution engine.

mod day_type;
mod direction;
mod schedule;
mod time;

pub use day_type::DayType;
pub use direction::Direction;
pub use schedule::{DataStatus, RouteEnds, SchedulePayload, ScheduleRecord, SourceStatus};
pub use time::{TimeOfDay, parse_times_lenient};
