//! Time-of-day handling for schedule payloads.
//!
//! The upstream provider publishes departure times as strings with no
//! guarantee of format: `"06:00"`, `"6:0"` and `"06:00:00"` all occur in
//! real responses. The parser here is deliberately tolerant; a malformed
//! entry is skipped by callers rather than aborting a whole batch.
//!
//! `Display` always renders zero-padded `HH:MM`, so lexicographic ordering
//! of the rendered strings matches chronological ordering. The canonical
//! payload relies on this.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wall-clock time of day (no date attached).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Construct from components. Returns `None` when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Tolerant parse of a provider time string.
    ///
    /// Accepts `HH:MM`, `HH:MM:SS` and unpadded variants like `6:0`.
    /// Surrounding whitespace is ignored. Returns `None` on anything that
    /// does not yield an in-range hour and minute.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut parts = s.split(':');

        let hour: u32 = parts.next()?.trim().parse().ok()?;
        let minute: u32 = parts.next()?.trim().parse().ok()?;

        // A third component (seconds) is allowed and discarded, but it must
        // at least be numeric so that garbage like "06:00:xx" is rejected.
        if let Some(rest) = parts.next() {
            let _: u32 = rest.trim().parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }

        Self::new(hour, minute)
    }

    /// Hour component (0-23).
    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    /// Minute component (0-59).
    pub fn minute(&self) -> u32 {
        self.minute as u32
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse_lenient(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {s:?}")))
    }
}

/// Parse a batch of provider time strings, skipping malformed entries.
///
/// Returns the parsed times in input order (callers sort).
pub fn parse_times_lenient<'a, I>(raw: I) -> Vec<TimeOfDay>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter_map(|s| {
            let parsed = TimeOfDay::parse_lenient(s);
            if parsed.is_none() {
                tracing::warn!(time = %s, "skipping malformed schedule time");
            }
            parsed
        })
        .collect()
}
