//! Wire types for the upstream schedule and alerts providers.
//!
//! These mirror the provider's response shapes as closely as possible;
//! conversion to domain types happens in [`super::convert`]. No field here
//! is trusted: ordering, completeness and time formats are all unreliable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw planned-departure row from the schedule provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScheduleRow {
    /// Human-readable route string, e.g. `"HARBOUR - CENTRAL"`.
    #[serde(default)]
    pub route_name: String,

    /// Direction code, nominally `G` or `D`.
    #[serde(default)]
    pub direction: String,

    /// Departure time string with no format guarantee.
    #[serde(default)]
    pub time_string: String,

    /// Day-type code, nominally `I` (weekday), `C` (Saturday) or `P` (Sunday).
    #[serde(default)]
    pub day_type: String,
}

/// One disruption alert from the alerts provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlert {
    /// Line code the alert applies to.
    pub line_code: String,

    /// Free-text disruption message.
    pub message: String,

    /// When the alert was last updated.
    pub update_time: DateTime<Utc>,
}
