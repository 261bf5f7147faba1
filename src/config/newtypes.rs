//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use std::fmt;

use url::Url;

use crate::clients::HttpError;
use crate::error::ConfigError;

/// A validated Elympics API key.
///
/// This newtype ensures the key is non-empty and masks its value in debug
/// output to prevent accidental exposure in logs. Anonymous access is
/// expressed by not configuring a key at all, never by an empty one.
///
/// # Example
///
/// ```rust
/// use elympics_api::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// assert_eq!(format!("{:?}", key), "ApiKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(*****)")
    }
}

/// The root URL of the Elympics API.
///
/// Trailing slashes are trimmed on construction, so the base never ends
/// with `/` and tails such as `/getHighscores` can be appended directly.
///
/// # Example
///
/// ```rust
/// use elympics_api::Endpoint;
///
/// let endpoint = Endpoint::new("https://dollarone.games/elympics/").unwrap();
/// assert_eq!(endpoint.as_ref(), "https://dollarone.games/elympics");
///
/// let url = endpoint.resolve("/getHighscores").unwrap();
/// assert_eq!(url.as_str(), "https://dollarone.games/elympics/getHighscores");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// The public Elympics endpoint.
    pub const DEFAULT: &'static str = "https://dollarone.games/elympics";

    /// Creates a new validated endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if the URL is not absolute.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');

        match Url::parse(trimmed) {
            Ok(parsed) if !parsed.cannot_be_a_base() => Ok(Self(trimmed.to_string())),
            _ => Err(ConfigError::InvalidEndpoint { url }),
        }
    }

    /// Resolves a tail path against this endpoint.
    ///
    /// A tail that is itself an absolute URL (as continuation links usually
    /// are) is used verbatim; anything else is appended to the base.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if the result is not a valid URL.
    pub fn resolve(&self, tail: &str) -> Result<Url, HttpError> {
        match Url::parse(tail) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let joined = format!("{}{tail}", self.0);
                Url::parse(&joined).map_err(|source| HttpError::InvalidUrl {
                    url: joined,
                    source,
                })
            }
            Err(source) => Err(HttpError::InvalidUrl {
                url: tail.to_string(),
                source,
            }),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
