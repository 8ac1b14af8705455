//! Programmable mock provider for testing without upstream access.
//!
//! Serves pre-loaded schedule rows and alerts per line, can be told to
//! fail, and counts calls so tests can assert on cache behaviour.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use super::error::UpstreamError;
use super::types::{RawAlert, RawScheduleRow};
use super::{AlertProvider, ScheduleProvider};

#[derive(Default)]
struct MockState {
    schedules: HashMap<String, Vec<RawScheduleRow>>,
    alerts: HashMap<String, Vec<RawAlert>>,
    /// Lines whose schedule fetch should fail.
    failing_schedules: HashMap<String, String>,
    /// Whether alert fetches should fail for all lines.
    alerts_down: bool,
}

/// Mock upstream provider backed by in-memory fixtures.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<RwLock<MockState>>,
    schedule_calls: Arc<AtomicUsize>,
    alert_calls: Arc<AtomicUsize>,
    /// Artificial latency per call, to widen race windows in tests.
    delay: Option<Duration>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add artificial latency to every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the schedule rows served for a line.
    pub async fn set_schedule(&self, line_code: &str, rows: Vec<RawScheduleRow>) {
        let mut state = self.state.write().await;
        state.failing_schedules.remove(line_code);
        state.schedules.insert(line_code.to_string(), rows);
    }

    /// Make schedule fetches for a line fail with the given message.
    pub async fn fail_schedule(&self, line_code: &str, message: &str) {
        let mut state = self.state.write().await;
        state
            .failing_schedules
            .insert(line_code.to_string(), message.to_string());
    }

    /// Set the alerts served for a line.
    pub async fn set_alerts(&self, line_code: &str, alerts: Vec<RawAlert>) {
        let mut state = self.state.write().await;
        state.alerts.insert(line_code.to_string(), alerts);
    }

    /// Make all alert fetches fail.
    pub async fn set_alerts_down(&self, down: bool) {
        self.state.write().await.alerts_down = down;
    }

    /// Number of schedule fetches made so far.
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    /// Number of alert fetches made so far.
    pub fn alert_calls(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ScheduleProvider for MockUpstream {
    async fn fetch_schedule(&self, line_code: &str) -> Result<Vec<RawScheduleRow>, UpstreamError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        if let Some(message) = state.failing_schedules.get(line_code) {
            return Err(UpstreamError::Api {
                status: 503,
                message: message.clone(),
            });
        }

        Ok(state.schedules.get(line_code).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl AlertProvider for MockUpstream {
    async fn fetch_alerts(&self, line_code: &str) -> Result<Vec<RawAlert>, UpstreamError> {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        if state.alerts_down {
            return Err(UpstreamError::Api {
                status: 500,
                message: "alerts provider unavailable".to_string(),
            });
        }

        Ok(state.alerts.get(line_code).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_programmed_rows_and_counts_calls() {
        let mock = MockUpstream::new();
        mock.set_schedule(
            "42",
            vec![RawScheduleRow {
                route_name: "A - B".into(),
                direction: "G".into(),
                time_string: "06:00".into(),
                day_type: "I".into(),
            }],
        )
        .await;

        let rows = mock.fetch_schedule("42").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(mock.schedule_calls(), 1);

        // Unknown lines yield an empty payload, not an error.
        let rows = mock.fetch_schedule("99").await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(mock.schedule_calls(), 2);
    }

    #[tokio::test]
    async fn programmed_failures_surface_as_errors() {
        let mock = MockUpstream::new();
        mock.fail_schedule("42", "boom").await;

        let err = mock.fetch_schedule("42").await.unwrap_err();
        assert!(err.to_string().contains("boom"));

        mock.set_alerts_down(true).await;
        assert!(mock.fetch_alerts("42").await.is_err());
        assert_eq!(mock.alert_calls(), 1);
    }
}
