//! Clients for the upstream schedule and alerts providers.
//!
//! The provider is an opaque municipal data service with two relevant
//! endpoints: planned departures per line and disruption alerts per line.
//! Key characteristics:
//! - slow (schedule responses can take >10 s) and rate-limited
//! - no ordering, completeness or format guarantees on rows
//! - failure is routine, so every caller must have a degraded path
//!
//! The [`ScheduleProvider`] and [`AlertProvider`] traits are the seams the
//! resolvers depend on; [`MockUpstream`] substitutes for the HTTP client in
//! tests.

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{UpstreamClient, UpstreamConfig};
pub use convert::build_payload;
pub use error::UpstreamError;
pub use mock::MockUpstream;
pub use types::{RawAlert, RawScheduleRow};

/// Source of raw planned-departure rows for a line.
#[async_trait::async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn fetch_schedule(&self, line_code: &str) -> Result<Vec<RawScheduleRow>, UpstreamError>;
}

/// Source of disruption alerts for a line.
#[async_trait::async_trait]
pub trait AlertProvider: Send + Sync {
    async fn fetch_alerts(&self, line_code: &str) -> Result<Vec<RawAlert>, UpstreamError>;
}
