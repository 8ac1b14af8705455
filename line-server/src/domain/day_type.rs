//! Day-type classification for schedule variants.
//!
//! The upstream provider publishes three planned-schedule variants per line:
//! one for weekdays, one for Saturdays and one for Sundays. A calendar date
//! selects exactly one variant.

use chrono::{Datelike, NaiveDate, Weekday};

/// Which planned-schedule variant applies to a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayType {
    /// Monday through Friday.
    Weekday,
    Saturday,
    Sunday,
}

impl DayType {
    /// Classify a calendar date.
    pub fn for_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => DayType::Saturday,
            Weekday::Sun => DayType::Sunday,
            _ => DayType::Weekday,
        }
    }

    /// Canonical name, used as the persistent-store column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Weekday => "WEEKDAY",
            DayType::Saturday => "SATURDAY",
            DayType::Sunday => "SUNDAY",
        }
    }

    /// Parse the canonical name back from the persistent store.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WEEKDAY" => Some(DayType::Weekday),
            "SATURDAY" => Some(DayType::Saturday),
            "SUNDAY" => Some(DayType::Sunday),
            _ => None,
        }
    }

    /// Whether an upstream raw-row day-type code belongs to this variant.
    ///
    /// The provider encodes the variant as a single letter: `I` for
    /// weekdays, `C` for Saturday, `P` for Sunday.
    pub fn matches_provider_code(&self, code: &str) -> bool {
        match self {
            DayType::Weekday => code.eq_ignore_ascii_case("I"),
            DayType::Saturday => code.eq_ignore_ascii_case("C"),
            DayType::Sunday => code.eq_ignore_ascii_case("P"),
        }
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
