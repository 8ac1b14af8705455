//! Upstream HTTP client for schedule and alerts data.
//!
//! Provides async methods for the planned-schedule and disruption-alert
//! endpoints. The provider is slow and rate-limited, so a semaphore bounds
//! concurrent requests and every request carries an explicit timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::error::UpstreamError;
use super::types::{RawAlert, RawScheduleRow};
use super::{AlertProvider, ScheduleProvider};

/// Default maximum concurrent upstream requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default timeout for schedule fetches (the slow endpoint).
const DEFAULT_SCHEDULE_TIMEOUT_SECS: u64 = 15;

/// Default timeout for alert fetches.
const DEFAULT_ALERTS_TIMEOUT_SECS: u64 = 10;

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the provider.
    pub base_url: String,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Timeout for schedule fetches, in seconds.
    pub schedule_timeout_secs: u64,
    /// Timeout for alert fetches, in seconds.
    pub alerts_timeout_secs: u64,
}

impl UpstreamConfig {
    /// Create a new config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            schedule_timeout_secs: DEFAULT_SCHEDULE_TIMEOUT_SECS,
            alerts_timeout_secs: DEFAULT_ALERTS_TIMEOUT_SECS,
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set the schedule fetch timeout.
    pub fn with_schedule_timeout(mut self, secs: u64) -> Self {
        self.schedule_timeout_secs = secs;
        self
    }

    /// Set the alerts fetch timeout.
    pub fn with_alerts_timeout(mut self, secs: u64) -> Self {
        self.alerts_timeout_secs = secs;
        self
    }
}

/// HTTP client for the upstream provider.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    semaphore: Arc<Semaphore>,
}

impl UpstreamClient {
    /// Create a new client with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .user_agent("line-server/0.1")
            .build()?;

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            http,
            config,
            semaphore,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        timeout: Duration,
    ) -> Result<T, UpstreamError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| UpstreamError::Api {
                status: 0,
                message: "semaphore closed".to_string(),
            })?;

        let response = self.http.get(&url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Parse {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

#[async_trait::async_trait]
impl ScheduleProvider for UpstreamClient {
    /// Fetch all raw planned-departure rows for a line.
    ///
    /// Returns rows for every day type; filtering happens downstream.
    async fn fetch_schedule(&self, line_code: &str) -> Result<Vec<RawScheduleRow>, UpstreamError> {
        let url = format!("{}/schedule/{}", self.config.base_url, line_code);
        self.get_json(url, Duration::from_secs(self.config.schedule_timeout_secs))
            .await
    }
}

#[async_trait::async_trait]
impl AlertProvider for UpstreamClient {
    /// Fetch active disruption alerts for a line.
    async fn fetch_alerts(&self, line_code: &str) -> Result<Vec<RawAlert>, UpstreamError> {
        let url = format!("{}/alerts/{}", self.config.base_url, line_code);
        self.get_json(url, Duration::from_secs(self.config.alerts_timeout_secs))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = UpstreamConfig::new("http://localhost:8080")
            .with_max_concurrent(8)
            .with_schedule_timeout(30)
            .with_alerts_timeout(5);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.schedule_timeout_secs, 30);
        assert_eq!(config.alerts_timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = UpstreamConfig::new("http://example.com");
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.schedule_timeout_secs, DEFAULT_SCHEDULE_TIMEOUT_SECS);
        assert_eq!(config.alerts_timeout_secs, DEFAULT_ALERTS_TIMEOUT_SECS);
    }

    #[test]
    fn client_creation() {
        let client = UpstreamClient::new(UpstreamConfig::new("http://example.com"));
        assert!(client.is_ok());
    }
}
