//! Error types for the Elympics API client.
//!
//! This module contains error types used for configuration and validation
//! errors. Errors raised while talking to the API live in
//! [`crate::clients::HttpError`].
//!
//! # Example
//!
//! ```rust
//! use elympics_api::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building the client configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Omit the key entirely for anonymous access.")]
    EmptyApiKey,

    /// Endpoint URL is invalid.
    #[error("Invalid endpoint URL '{url}'. Please provide an absolute URL with scheme (e.g., 'https://dollarone.games/elympics').")]
    InvalidEndpoint {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {reason}")]
    HttpClient {
        /// Why construction failed (TLS backend, proxy configuration, ...).
        reason: String,
    },
}
