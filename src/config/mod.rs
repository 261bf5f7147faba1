//! Configuration types for the Elympics API client.
//!
//! This module provides the configuration used to connect to the Elympics
//! highscore service.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ElympicsConfig`]: The configuration shared by every request
//! - [`ElympicsConfigBuilder`]: A builder for constructing [`ElympicsConfig`] instances
//! - [`ApiKey`]: A validated API key newtype with masked debug output
//! - [`Endpoint`]: The normalized root URL of the API
//! - [`RateLimitPolicy`]: Bounds for the rate-limit retry loop
//!
//! # Example
//!
//! ```rust
//! use elympics_api::{ApiKey, ElympicsConfig, Endpoint};
//!
//! let config = ElympicsConfig::builder()
//!     .endpoint(Endpoint::new("http://localhost:8080/elympics").unwrap())
//!     .key(ApiKey::new("my-api-key").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.endpoint().as_ref(), "http://localhost:8080/elympics");
//! ```

mod newtypes;

pub use newtypes::{ApiKey, Endpoint};

use std::sync::Arc;
use std::time::Duration;

use crate::clients::{
    Connector, ImpatientConnector, JsonCodec, ReqwestConnector, UnknownFields,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
};
use crate::error::ConfigError;

/// Bounds for retrying requests the server rejected with `403` plus a
/// `Retry-After` header.
///
/// The default retries indefinitely and without delay, so a rate-limited
/// call simply keeps re-attempting until the server lets it through. Set
/// [`max_retries`](Self::max_retries) to turn exhaustion into an error.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use elympics_api::RateLimitPolicy;
///
/// let policy = RateLimitPolicy::default()
///     .max_retries(5)
///     .backoff(Duration::from_millis(250));
///
/// assert_eq!(policy.retry_limit(), Some(5));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitPolicy {
    max_retries: Option<u32>,
    backoff: Duration,
}

impl RateLimitPolicy {
    /// Caps the number of rate-limit retries for a single request.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets a fixed delay before each rate-limit retry.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the retry cap, or `None` when retries are unbounded.
    #[must_use]
    pub const fn retry_limit(&self) -> Option<u32> {
        self.max_retries
    }

    /// Returns the delay applied before each retry.
    #[must_use]
    pub const fn backoff_delay(&self) -> Duration {
        self.backoff
    }

    /// Returns `true` if another retry is allowed after `retries` retries.
    #[must_use]
    pub fn allows(&self, retries: u32) -> bool {
        self.max_retries.map_or(true, |max| retries < max)
    }
}

/// Configuration for the Elympics API client.
///
/// Holds everything a request borrows from the root client: the endpoint,
/// the optional API key and the [`Connector`] used to open connections.
///
/// # Thread Safety
///
/// `ElympicsConfig` is `Clone`, `Send`, and `Sync`. The connector is shared
/// behind an `Arc` and is never mutated after construction.
#[derive(Clone, Debug)]
pub struct ElympicsConfig {
    endpoint: Endpoint,
    key: Option<ApiKey>,
    connector: Arc<dyn Connector>,
    rate_limit: RateLimitPolicy,
    max_pages: Option<usize>,
    codec: JsonCodec,
}

impl ElympicsConfig {
    /// Creates a new builder for constructing an `ElympicsConfig`.
    #[must_use]
    pub fn builder() -> ElympicsConfigBuilder {
        ElympicsConfigBuilder::new()
    }

    /// Returns the API endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the API key, if configured.
    #[must_use]
    pub const fn key(&self) -> Option<&ApiKey> {
        self.key.as_ref()
    }

    /// Returns the connector used to open connections.
    #[must_use]
    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// Returns the rate-limit retry policy.
    #[must_use]
    pub const fn rate_limit(&self) -> &RateLimitPolicy {
        &self.rate_limit
    }

    /// Returns the maximum number of pages fetched per call, if bounded.
    #[must_use]
    pub const fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// Returns the JSON codec used to decode responses.
    #[must_use]
    pub const fn codec(&self) -> &JsonCodec {
        &self.codec
    }
}

// Verify ElympicsConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ElympicsConfig>();
};

/// Builder for constructing [`ElympicsConfig`] instances.
///
/// # Defaults
///
/// - `endpoint`: [`Endpoint::DEFAULT`]
/// - `key`: `None` (anonymous access)
/// - `connector`: [`ReqwestConnector`] wrapped in an [`ImpatientConnector`]
///   with 10 second connect and read timeouts
/// - `rate_limit_policy`: unbounded, no backoff
/// - `max_pages`: unbounded
/// - `unknown_fields`: [`UnknownFields::Ignore`]
///
/// A custom [`connector`](Self::connector) replaces the default entirely, so
/// `proxy`, `timeouts` and `user_agent_prefix` only shape the default one.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use elympics_api::{ApiKey, ElympicsConfig};
///
/// let config = ElympicsConfig::builder()
///     .key(ApiKey::new("key").unwrap())
///     .timeouts(Duration::from_secs(2), Duration::from_secs(30))
///     .max_pages(20)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.max_pages(), Some(20));
/// ```
#[derive(Debug, Default)]
pub struct ElympicsConfigBuilder {
    endpoint: Option<Endpoint>,
    key: Option<ApiKey>,
    connector: Option<Arc<dyn Connector>>,
    proxy: Option<reqwest::Proxy>,
    timeouts: Option<(Duration, Duration)>,
    user_agent_prefix: Option<String>,
    rate_limit: RateLimitPolicy,
    max_pages: Option<usize>,
    unknown_fields: UnknownFields,
}

impl ElympicsConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the API key sent with every request.
    #[must_use]
    pub fn key(mut self, key: ApiKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets a custom connector, replacing the default transport.
    #[must_use]
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Routes the default connector through the given proxy instead of the
    /// system default one.
    #[must_use]
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the connect and read timeouts of the default connector.
    #[must_use]
    pub const fn timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.timeouts = Some((connect, read));
        self
    }

    /// Sets the user agent prefix of the default connector.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the rate-limit retry policy.
    #[must_use]
    pub const fn rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Caps how many pages a single paginated call may fetch.
    #[must_use]
    pub const fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Sets how response fields without a counterpart in the target type
    /// are treated.
    #[must_use]
    pub const fn unknown_fields(mut self, unknown_fields: UnknownFields) -> Self {
        self.unknown_fields = unknown_fields;
        self
    }

    /// Builds the [`ElympicsConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the default connector cannot
    /// be created (for example, an unusable proxy).
    pub fn build(self) -> Result<ElympicsConfig, ConfigError> {
        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let base = ReqwestConnector::new(self.proxy, self.user_agent_prefix.as_deref())?;
                let (connect, read) = self
                    .timeouts
                    .unwrap_or((DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT));
                Arc::new(ImpatientConnector::with_timeouts(base, connect, read))
            }
        };

        Ok(ElympicsConfig {
            endpoint: self.endpoint.unwrap_or_default(),
            key: self.key,
            connector,
            rate_limit: self.rate_limit,
            max_pages: self.max_pages,
            codec: JsonCodec::new(self.unknown_fields),
        })
    }
}
