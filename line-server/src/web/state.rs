//! Application state for the web layer.

use std::sync::Arc;

use crate::pool::LinePoolAggregator;
use crate::resolver::ScheduleResolver;
use crate::status::StatusResolver;

/// Shared application state.
///
/// Contains all the services needed to handle requests. The status
/// resolver internally shares the same schedule resolver and pool
/// aggregator, so the whole graph is built once in `main`.
#[derive(Clone)]
pub struct AppState {
    /// Tiered schedule resolver
    pub schedules: Arc<ScheduleResolver>,

    /// Virtual line aggregator
    pub pool: Arc<LinePoolAggregator>,

    /// Line status resolver
    pub status: Arc<StatusResolver>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        schedules: Arc<ScheduleResolver>,
        pool: Arc<LinePoolAggregator>,
        status: Arc<StatusResolver>,
    ) -> Self {
        Self {
            schedules,
            pool,
            status,
        }
    }
}
