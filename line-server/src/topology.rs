//! Static first/last service times for rail lines.
//!
//! Rail lines (metro, tram, funicular, the cross-city rail link) publish
//! fixed operating hours in the network topology rather than per-day
//! planned schedules, so their service windows come from this table
//! instead of upstream fetches. Several rail lines run past midnight:
//! a last time earlier than the first time means the window wraps.

use std::collections::HashMap;

use crate::domain::TimeOfDay;

/// Fixed operating hours for one rail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyEntry {
    pub first_time: TimeOfDay,
    pub last_time: TimeOfDay,
}

impl TopologyEntry {
    /// Whether the service window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.last_time < self.first_time
    }
}

/// Lookup table of rail-line operating hours.
///
/// Constructed once at startup and passed by reference; no ambient state.
#[derive(Debug, Clone, Default)]
pub struct RailTopology {
    entries: HashMap<String, TopologyEntry>,
}

impl RailTopology {
    /// Create an empty topology (bus-only deployments, tests).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line with fixed operating hours. Invalid time strings are
    /// skipped rather than propagated; a missing entry just means the
    /// line falls back to schedule-derived windows.
    pub fn add(mut self, line_code: &str, first: &str, last: &str) -> Self {
        if let (Some(first_time), Some(last_time)) = (
            TimeOfDay::parse_lenient(first),
            TimeOfDay::parse_lenient(last),
        ) {
            self.entries.insert(
                line_code.to_uppercase(),
                TopologyEntry {
                    first_time,
                    last_time,
                },
            );
        } else {
            tracing::warn!(line_code, first, last, "skipping topology entry with bad times");
        }
        self
    }

    /// Operating hours for a line, if it is topology-managed.
    /// Lookup is case-insensitive.
    pub fn get(&self, line_code: &str) -> Option<&TopologyEntry> {
        self.entries.get(&line_code.to_uppercase())
    }

    /// Number of topology-managed lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no lines are topology-managed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The default rail network: metro (M), tram (T) and funicular (F) lines
/// plus the cross-city rail link, which runs 06:00 to midnight and
/// therefore wraps.
pub fn default_rail_topology() -> RailTopology {
    RailTopology::new()
        .add("MARMARAY", "06:00", "00:00")
        .add("M1", "06:00", "00:20")
        .add("M2", "06:15", "00:00")
        .add("M3", "06:00", "23:45")
        .add("M4", "06:00", "00:00")
        .add("M5", "06:00", "23:59")
        .add("M6", "06:30", "22:30")
        .add("M7", "06:00", "23:59")
        .add("T1", "06:00", "23:30")
        .add("T3", "07:00", "21:00")
        .add("T4", "06:00", "23:50")
        .add("T5", "06:10", "23:40")
        .add("F1", "06:15", "23:00")
}
