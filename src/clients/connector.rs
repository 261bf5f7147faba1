//! Pluggable transport for the Elympics API client.
//!
//! A [`Connector`] opens a [`Connection`] to a URL; the
//! [`Requester`](crate::clients::Requester) then configures the connection
//! (verb, headers) and sends it. Swap the connector to route requests through
//! a proxy, change timeouts, or replace the network with an in-memory fake in
//! tests.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use elympics_api::clients::{ImpatientConnector, ReqwestConnector};
//! use elympics_api::ElympicsConfig;
//!
//! let base = ReqwestConnector::new(None, Some("MyGame/1.0")).unwrap();
//! let connector = ImpatientConnector::with_timeout(base, Duration::from_secs(3));
//!
//! let config = ElympicsConfig::builder().connector(connector).build().unwrap();
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::clients::errors::HttpError;
use crate::clients::http_response::HttpResponse;
use crate::error::ConfigError;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Client version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Opens connections to URLs.
///
/// Implementations are shared read-only between requests and must be
/// `Send + Sync`.
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the connection cannot be opened.
    fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, HttpError>;
}

/// A single, not yet sent, HTTP exchange.
///
/// A connection is configured and then consumed by [`send`](Self::send);
/// it is never reused.
#[async_trait]
pub trait Connection: Send {
    /// Returns the URL this connection targets.
    fn url(&self) -> &Url;

    /// Returns the verb currently configured.
    fn method(&self) -> &str;

    /// Sets the request verb.
    ///
    /// Transports are expected to accept arbitrary verbs, not only the
    /// standard ones.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Configuration`] if the transport cannot carry it.
    fn set_method(&mut self, method: &str) -> Result<(), HttpError>;

    /// Sets a request header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidHeader`] for names or values that are not
    /// valid HTTP.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HttpError>;

    /// Applies connect and read timeouts.
    fn set_timeouts(&mut self, connect: Duration, read: Duration);

    /// Returns the connection this one wraps, if any.
    ///
    /// The request verb is propagated one layer down so wrapping transports
    /// stay consistent with the connection they delegate to.
    fn delegate(&mut self) -> Option<&mut dyn Connection> {
        None
    }

    /// Sends the request and reads the full response.
    ///
    /// Any HTTP status, including 4xx and 5xx, is a successful send.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if no response could be obtained.
    async fn send(self: Box<Self>, body: Option<Vec<u8>>) -> Result<HttpResponse, HttpError>;
}

/// The default transport, backed by a [`reqwest::Client`] with rustls.
#[derive(Clone, Debug)]
pub struct ReqwestConnector {
    client: reqwest::Client,
}

impl ReqwestConnector {
    /// Creates a connector, optionally routed through `proxy`.
    ///
    /// The `User-Agent` header identifies this library, preceded by
    /// `user_agent_prefix` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the client cannot be built.
    pub fn new(
        proxy: Option<reqwest::Proxy>,
        user_agent_prefix: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let prefix = user_agent_prefix.map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{prefix}Elympics API Library v{SDK_VERSION} | Rust {rust_version}");

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| ConfigError::HttpClient {
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for ReqwestConnector {
    fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, HttpError> {
        Ok(Box::new(ReqwestConnection {
            client: self.client.clone(),
            url: url.clone(),
            method: Method::GET,
            headers: HeaderMap::new(),
            timeout: None,
        }))
    }
}

/// A connection opened by [`ReqwestConnector`].
#[derive(Debug)]
pub struct ReqwestConnection {
    client: reqwest::Client,
    url: Url,
    method: Method,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

#[async_trait]
impl Connection for ReqwestConnection {
    fn url(&self) -> &Url {
        &self.url
    }

    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn set_method(&mut self, method: &str) -> Result<(), HttpError> {
        self.method =
            Method::from_bytes(method.as_bytes()).map_err(|e| HttpError::Configuration {
                method: method.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
        let invalid = || HttpError::InvalidHeader {
            name: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    // reqwest only offers a per-request deadline, so the connect and read
    // budgets are summed into it.
    fn set_timeouts(&mut self, connect: Duration, read: Duration) {
        self.timeout = Some(connect + read);
    }

    async fn send(self: Box<Self>, body: Option<Vec<u8>>) -> Result<HttpResponse, HttpError> {
        let Self {
            client,
            url,
            method,
            headers,
            timeout,
        } = *self;

        let mut request = client.request(method, url.clone()).headers(headers);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::transport(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::transport(url.as_str(), e))?;

        let response = HttpResponse::new(status.as_u16(), final_url, headers, body.to_vec());
        Ok(match status.canonical_reason() {
            Some(reason) => response.with_reason(reason),
            None => response,
        })
    }
}

/// A [`Connector`] decorator that applies connect and read timeouts.
///
/// Defaults to [`DEFAULT_CONNECT_TIMEOUT`] and [`DEFAULT_READ_TIMEOUT`].
#[derive(Clone, Debug)]
pub struct ImpatientConnector<C> {
    base: C,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl<C: Connector> ImpatientConnector<C> {
    /// Wraps `base` with the default timeouts.
    pub const fn new(base: C) -> Self {
        Self::with_timeouts(base, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }

    /// Wraps `base` using `timeout` for both connecting and reading.
    pub const fn with_timeout(base: C, timeout: Duration) -> Self {
        Self::with_timeouts(base, timeout, timeout)
    }

    /// Wraps `base` with separate connect and read timeouts.
    pub const fn with_timeouts(base: C, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            base,
            connect_timeout,
            read_timeout,
        }
    }

    /// Returns the connect timeout.
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the read timeout.
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

impl<C: Connector> Connector for ImpatientConnector<C> {
    fn connect(&self, url: &Url) -> Result<Box<dyn Connection>, HttpError> {
        let mut connection = self.base.connect(url)?;
        connection.set_timeouts(self.connect_timeout, self.read_timeout);
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost:8080/elympics/getHighscores").unwrap()
    }

    #[test]
    fn test_reqwest_connection_accepts_custom_verbs() {
        let connector = ReqwestConnector::new(None, None).unwrap();
        let mut connection = connector.connect(&url()).unwrap();

        connection.set_method("PATCH").unwrap();
        assert_eq!(connection.method(), "PATCH");

        connection.set_method("PURGE").unwrap();
        assert_eq!(connection.method(), "PURGE");
    }

    #[test]
    fn test_reqwest_connection_rejects_invalid_verb() {
        let connector = ReqwestConnector::new(None, None).unwrap();
        let mut connection = connector.connect(&url()).unwrap();

        let err = connection.set_method("NOT A VERB").unwrap_err();
        assert!(matches!(err, HttpError::Configuration { method, .. } if method == "NOT A VERB"));
    }

    #[test]
    fn test_reqwest_connection_rejects_invalid_header() {
        let connector = ReqwestConnector::new(None, None).unwrap();
        let mut connection = connector.connect(&url()).unwrap();

        assert!(connection.set_header("key", "abc").is_ok());
        assert!(matches!(
            connection.set_header("bad header", "x"),
            Err(HttpError::InvalidHeader { .. })
        ));
        assert!(connection.set_header("key", "line\nbreak").is_err());
    }

    #[test]
    fn test_impatient_connector_defaults() {
        let connector = ImpatientConnector::new(ReqwestConnector::new(None, None).unwrap());
        assert_eq!(connector.connect_timeout(), Duration::from_secs(10));
        assert_eq!(connector.read_timeout(), Duration::from_secs(10));

        let connector = ImpatientConnector::with_timeout(
            ReqwestConnector::new(None, None).unwrap(),
            Duration::from_secs(3),
        );
        assert_eq!(connector.connect_timeout(), Duration::from_secs(3));
        assert_eq!(connector.read_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_impatient_connector_targets_url() {
        let connector = ImpatientConnector::new(ReqwestConnector::new(None, None).unwrap());
        let connection = connector.connect(&url()).unwrap();
        assert_eq!(connection.url(), &url());
    }

    #[test]
    fn test_connectors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestConnector>();
        assert_send_sync::<ImpatientConnector<ReqwestConnector>>();
    }
}
