//! Upstream provider error types.
//!
//! None of these are fatal to a resolution request: the schedule resolver
//! converts every variant into a sentinel FAILED record, and the status
//! resolver degrades to "no alerts".

/// Errors from the upstream schedule/alerts providers.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP transport failure, including request timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error status code.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("parse error: {message}")]
    Parse {
        message: String,
        /// Response body prefix, kept for diagnostics.
        body: Option<String>,
    },

    /// The provider answered with an empty payload. Indistinguishable from
    /// a broken response, so treated as a fetch failure rather than as
    /// "no service".
    #[error("empty payload from provider")]
    EmptyPayload,
}

impl UpstreamError {
    /// Whether the failure was a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Http(e) if e.is_timeout())
    }
}
