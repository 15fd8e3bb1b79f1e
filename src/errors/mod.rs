//! Error types and retry classification for the dashboard data core.
//!
//! This module provides:
//! - [`DataError`]: The main error enum for all upstream and configuration failures
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching or assembling dashboard data.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines whether the
/// retry policy attempts the operation again.
///
/// Degraded-but-successful outcomes (stale cache fallback, partially populated
/// vaults) are deliberately *not* errors; they are surfaced through
/// [`Freshness`](crate::cache::Freshness) and
/// [`DataStatus`](crate::models::DataStatus) on the success path.
#[derive(Error, Debug)]
pub enum DataError {
    /// A network-level error occurred while communicating with an upstream.
    /// Connection resets and DNS failures are transient.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request to the upstream timed out.
    /// Should retry with exponential backoff.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The upstream that timed out
        provider: String,
    },

    /// The upstream rate limited the request (HTTP 429).
    /// Should retry with exponential backoff.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The upstream that rate limited the request
        provider: String,
    },

    /// The upstream returned a server error (HTTP 5xx).
    /// Transient - the upstream may recover on a later attempt.
    #[error("Upstream server error: {provider} returned HTTP {status}")]
    UpstreamServer {
        /// The upstream that returned the error
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The upstream rejected the request (HTTP 4xx other than 429).
    /// Terminal - a bad request or bad credentials won't improve by retrying.
    #[error("Upstream client error: {provider} returned HTTP {status}: {message}")]
    UpstreamClient {
        /// The upstream that rejected the request
        provider: String,
        /// The HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The upstream response could not be parsed into the expected shape.
    #[error("Parse error: {provider} - {message}")]
    Parse {
        /// The upstream whose response failed to parse
        provider: String,
        /// Description of the parse failure
        message: String,
    },

    /// The requested vault or market does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No API key is configured for an authenticated upstream.
    #[error("API key is not configured")]
    MissingApiKey,

    /// A configuration value could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// All retry attempts were exhausted.
    /// Terminal - carries the last underlying cause and the attempt count.
    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: Don't retry, the error is terminal
    /// - [`RetryClass::WithBackoff`]: Retry with exponential backoff
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient errors - retry with backoff
            Self::Network(_)
            | Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::UpstreamServer { .. } => RetryClass::WithBackoff,

            // Terminal errors - never retry
            Self::UpstreamClient { .. }
            | Self::Parse { .. }
            | Self::NotFound(_)
            | Self::MissingApiKey
            | Self::Configuration(_)
            | Self::RetriesExhausted { .. } => RetryClass::Never,
        }
    }

    /// Map a non-success HTTP status from `provider` into the matching variant.
    pub fn from_status(provider: &str, status: reqwest::StatusCode, message: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                provider: provider.to_string(),
            }
        } else if status.is_server_error() {
            Self::UpstreamServer {
                provider: provider.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::UpstreamClient {
                provider: provider.to_string(),
                status: status.as_u16(),
                message,
            }
        }
    }
}
