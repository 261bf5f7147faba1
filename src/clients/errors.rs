//! HTTP-specific error types for the Elympics API client.
//!
//! This module contains the error taxonomy for requests, from transport
//! failures that happen before any response exists to API errors enriched
//! with the server's error body.
//!
//! # Error Handling
//!
//! - [`HttpError::Transport`]: network/TLS failure, propagated unchanged
//! - [`HttpError::Configuration`]: the transport cannot carry the requested verb
//! - [`HttpError::UnsupportedEncoding`]: a `Content-Encoding` other than gzip
//! - [`HttpError::NotFound`]: the resource does not exist ([`AbsentResourceError`])
//! - [`HttpError::Api`]: any other non-2xx outcome ([`ApiError`])
//! - [`HttpError::Decode`]: the body does not match the target shape ([`DecodeError`])
//!
//! # Example
//!
//! ```rust,ignore
//! use elympics_api::clients::HttpError;
//!
//! match elympics.get_highscores().await {
//!     Ok(scores) => println!("{} entries", scores.len()),
//!     Err(HttpError::NotFound(e)) => println!("no leaderboard at {}", e.url),
//!     Err(HttpError::Api(e)) => println!("API error {}: {:?}", e.code(), e.error_body),
//!     Err(e) => println!("request failed: {e}"),
//! }
//! ```

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned when the server reports that a resource does not exist.
///
/// Kept apart from [`ApiError`] so callers can treat "not found" as an
/// expected outcome.
#[derive(Debug, Error)]
#[error("Resource not found at {url}{}", .error_body.as_deref().map(|b| format!(": {b}")).unwrap_or_default())]
pub struct AbsentResourceError {
    /// The URL that was requested.
    pub url: String,
    /// The error body sent by the server, if any.
    pub error_body: Option<String>,
}

/// Error returned for a non-successful response that is not retried.
///
/// # Example
///
/// ```rust
/// use elympics_api::clients::ApiError;
///
/// let error = ApiError {
///     status: Some(500),
///     message: Some("Internal Server Error".to_string()),
///     url: "https://dollarone.games/elympics/getHighscores".to_string(),
///     error_body: Some("database unavailable".to_string()),
/// };
///
/// assert_eq!(error.code(), 500);
/// assert!(error.to_string().contains("database unavailable"));
/// ```
#[derive(Debug, Error)]
#[error(
    "Server returned HTTP response code: {}, message: '{}' for URL: {url}{}",
    self.code(),
    .message.as_deref().unwrap_or_default(),
    .error_body.as_deref().map(|b| format!(", body: {b}")).unwrap_or_default()
)]
pub struct ApiError {
    /// The HTTP status code of the response, if one was received.
    pub status: Option<u16>,
    /// The HTTP reason phrase of the response.
    pub message: Option<String>,
    /// The URL that was requested.
    pub url: String,
    /// The error body sent by the server, if any.
    pub error_body: Option<String>,
}

impl ApiError {
    /// Returns the status code, or `-1` when it is unknown.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.status.map_or(-1, i32::from)
    }
}

/// Error returned when a response body does not match the expected shape.
///
/// Carries the raw payload for diagnostics.
#[derive(Debug, Error)]
#[error("Failed to deserialize {payload}")]
pub struct DecodeError {
    /// The raw (decompressed) response body.
    pub payload: String,
    /// The underlying deserialization failure.
    #[source]
    pub source: serde_json::Error,
}

/// Error returned when the rate-limit retry budget has been exhausted.
///
/// Only raised when [`RateLimitPolicy::max_retries`](crate::RateLimitPolicy::max_retries)
/// is configured; by default rate-limited requests are retried indefinitely.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries}. Last response: {code} for URL: {url}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of retries that were attempted.
    pub tries: u32,
    /// The URL that was requested.
    pub url: String,
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or connection failure before any response was available.
    #[error("Network error for URL {url}: {source}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying transport failure.
        #[source]
        source: BoxError,
    },

    /// The transport could not be configured with the requested verb.
    #[error("Failed to set the request method to {method}: {reason}")]
    Configuration {
        /// The verb that was requested.
        method: String,
        /// Why the verb could not be applied.
        reason: String,
    },

    /// A request header name or value is not valid HTTP.
    #[error("Invalid request header '{name}'")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// A request URL could not be built.
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        /// The URL text that failed to parse.
        url: String,
        /// The underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The response declared a `Content-Encoding` this client cannot decode.
    #[error("Unexpected Content-Encoding: {encoding}")]
    UnsupportedEncoding {
        /// The declared encoding.
        encoding: String,
    },

    /// A gzip-encoded body could not be decompressed.
    #[error("Failed to decompress response from {url}: {source}")]
    Decompress {
        /// The URL that was requested.
        url: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The requested resource does not exist.
    #[error(transparent)]
    NotFound(#[from] AbsentResourceError),

    /// Any other non-successful response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response body does not match the target type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Rate-limit retries exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// A paginated call needed more pages than allowed.
    #[error("Exceeded maximum page count of {max_pages} at URL: {url}")]
    PageLimitExceeded {
        /// The configured page cap.
        max_pages: usize,
        /// The continuation URL that was not fetched.
        url: String,
    },
}

impl HttpError {
    /// Creates a [`HttpError::Transport`] from any underlying failure.
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Returns the HTTP status code associated with this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Api(e) => e.status,
            Self::MaxRetries(e) => Some(e.code),
            _ => None,
        }
    }

    /// Returns `true` if this error means the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
