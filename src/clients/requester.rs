//! The per-call request engine.
//!
//! A [`Requester`] collects parameters, headers and an optional raw body,
//! then executes exactly one logical call: it builds the request, sends it
//! through the configured [`Connector`](crate::clients::Connector), retries
//! while the server signals rate limiting, follows `Link` continuation pages
//! and decodes the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use elympics_api::Elympics;
//!
//! let elympics = Elympics::connect("my-api-key")?;
//!
//! let scores: Vec<Highscore> = elympics
//!     .requester()
//!     .with("key", "my-api-key")
//!     .fetch_all("/getHighscores")
//!     .await?
//!     .into_option()
//!     .unwrap_or_default();
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

use crate::clients::classify::{classify, Disposition};
use crate::clients::connector::Connection;
use crate::clients::errors::{HttpError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{ParamValue, RequestSpec};
use crate::clients::http_response::HttpResponse;
use crate::config::ElympicsConfig;

/// Name of the header carrying the API key.
pub const KEY_HEADER: &str = "key";

/// Size of the chunks a raw body source is read in.
pub const BODY_CHUNK_SIZE: usize = 32 * 1024;

const NOT_MODIFIED: u16 = 304;
const NO_CONTENT: u16 = 204;

/// A raw request body, read once and closed when dropped.
pub type BodySource = Box<dyn AsyncRead + Send + Unpin>;

/// The result of a call that may be answered with `304 Not Modified`.
///
/// `NotModified` means the resource is unchanged and the caller should keep
/// whatever value it already has; it is not an absent value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched<T> {
    /// A freshly decoded value.
    Value(T),
    /// The server answered `304 Not Modified`.
    NotModified,
}

impl<T> Fetched<T> {
    /// Returns the value, or `None` for [`Fetched::NotModified`].
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotModified => None,
        }
    }

    /// Returns the fresh value, or `prior` when the resource is unchanged.
    pub fn unwrap_or(self, prior: T) -> T {
        self.into_option().unwrap_or(prior)
    }

    /// Returns `true` for [`Fetched::NotModified`].
    pub const fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified)
    }

    /// Maps the fresh value, keeping `NotModified` as is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Value(value) => Fetched::Value(f(value)),
            Self::NotModified => Fetched::NotModified,
        }
    }
}

/// Builds and executes one logical API call.
///
/// Builder methods consume and return the requester; a terminal method
/// (`send`, `fetch`, `fetch_all`, `update`, `status_code`, `bytes`,
/// `response`) executes the call. The requester borrows the root configuration read-only, so any
/// number of requesters may run concurrently.
///
/// # Parameters
///
/// For `GET` and `DELETE` (unless [`in_body`](Self::in_body) is set),
/// parameters are appended to the URL as a percent-encoded query string.
/// For every other verb they are sent as a `key=value&...` body with the
/// configured content type, values written as-is. A raw [`body`](Self::body)
/// replaces the parameters as payload.
pub struct Requester<'a> {
    config: &'a ElympicsConfig,
    request: RequestSpec,
    body: Option<BodySource>,
}

impl fmt::Debug for Requester<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("request", &self.request)
            .field("has_body_source", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Requester<'a> {
    /// Creates a `POST` requester for the given configuration.
    #[must_use]
    pub fn new(config: &'a ElympicsConfig) -> Self {
        Self {
            config,
            request: RequestSpec::default(),
            body: None,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.request.parameters.push(key, value);
        self
    }

    /// Appends a parameter when `value` is present; `None` is dropped.
    #[must_use]
    pub fn with_opt<V: Into<ParamValue>>(
        mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.request.parameters.push_opt(key, value);
        self
    }

    /// Appends an enum-like parameter as a lowercased, hyphenated string.
    #[must_use]
    pub fn with_enum(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.request.parameters.push(key, ParamValue::variant(value));
        self
    }

    /// Overrides the first parameter named `key`, or appends it.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.request.parameters.set(key, value);
        self
    }

    /// Sets a request header. The last value set for a name wins, and
    /// explicit headers override the API key header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.set(name, Some(value.into()));
        self
    }

    /// Records a header as omitted, discarding any value set earlier.
    #[must_use]
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.request.headers.set(name, None);
        self
    }

    /// Requests a preview media type through the `Accept` header.
    #[must_use]
    pub fn preview(self, media_type: impl Into<String>) -> Self {
        self.header("Accept", media_type)
    }

    /// Sends `source` as the raw request body instead of the parameters.
    ///
    /// The source is read in [`BODY_CHUNK_SIZE`] chunks before the first
    /// attempt and dropped right after, whatever the outcome.
    #[must_use]
    pub fn body(mut self, source: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.body = Some(Box::new(source));
        self
    }

    /// Sets the request verb. Any verb the transport can carry is allowed.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.request.method = method.into();
        self
    }

    /// Sets the `Content-Type` of the request body.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request.content_type = content_type.into();
        self
    }

    /// Sends the parameters as a body even for `GET` and `DELETE`.
    #[must_use]
    pub const fn in_body(mut self) -> Self {
        self.request.force_body = true;
        self
    }

    /// Executes the call and discards the response body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn send(self, tail: &str) -> Result<(), HttpError> {
        let call = self.freeze(tail).await?;
        let response = call.exchange(tail).await?;
        if response.code != NOT_MODIFIED {
            response.decoded_body()?;
        }
        Ok(())
    }

    /// Executes the call and decodes the response into a new `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails or the body does not decode.
    pub async fn fetch<T: DeserializeOwned>(self, tail: &str) -> Result<Fetched<T>, HttpError> {
        let call = self.freeze(tail).await?;
        let response = call.exchange(tail).await?;
        if response.code == NOT_MODIFIED {
            return Ok(Fetched::NotModified);
        }
        let text = response.text()?;
        call.config.codec().decode(&text).map(Fetched::Value)
    }

    /// Executes the call for a sequence of `T`, following continuation pages.
    ///
    /// A `204 No Content` page contributes no elements. While a page carries
    /// a `Link` header with `rel="next"`, the same request is issued against
    /// that link and its elements are appended after the current ones.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if any page fails, or
    /// [`HttpError::PageLimitExceeded`] when a configured page cap is hit.
    pub async fn fetch_all<T: DeserializeOwned>(
        self,
        tail: &str,
    ) -> Result<Fetched<Vec<T>>, HttpError> {
        let call = self.freeze(tail).await?;
        let codec = call.config.codec();

        let mut items = Vec::new();
        let mut pages = 0usize;
        let mut next = Some(tail.to_string());

        while let Some(page) = next.take() {
            if let Some(max_pages) = call.config.max_pages() {
                if pages >= max_pages {
                    return Err(HttpError::PageLimitExceeded {
                        max_pages,
                        url: page,
                    });
                }
            }
            pages += 1;

            let response = call.exchange(&page).await?;
            match response.code {
                NOT_MODIFIED if pages == 1 => return Ok(Fetched::NotModified),
                NOT_MODIFIED | NO_CONTENT => {}
                _ => {
                    let text = response.text()?;
                    let mut page_items: Vec<T> = codec.decode(&text)?;
                    items.append(&mut page_items);
                }
            }

            next = response.next_link();
            if let Some(link) = &next {
                tracing::debug!(page = pages + 1, link = %link, "Following continuation link");
            }
        }

        Ok(Fetched::Value(items))
    }

    /// Executes the call and updates `instance` in place.
    ///
    /// Fields present in the response replace the instance's fields; a
    /// `304 Not Modified` leaves the instance untouched.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails or the body does not decode.
    pub async fn update<T>(self, tail: &str, instance: &mut T) -> Result<(), HttpError>
    where
        T: Serialize + DeserializeOwned,
    {
        let call = self.freeze(tail).await?;
        let response = call.exchange(tail).await?;
        if response.code == NOT_MODIFIED {
            return Ok(());
        }
        let text = response.text()?;
        call.config.codec().decode_into(&text, instance)
    }

    /// Issues a `GET` and returns the status code of the response.
    ///
    /// The status is returned as received, without classification or retry.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if no response could be obtained.
    pub async fn status_code(self, tail: &str) -> Result<u16, HttpError> {
        let call = self.method("GET").freeze(tail).await?;
        let url = call.url(tail)?;
        let response = call.attempt(&url).await?;
        Ok(response.code)
    }

    /// Executes the call and returns the decompressed response body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn bytes(self, tail: &str) -> Result<Vec<u8>, HttpError> {
        let call = self.freeze(tail).await?;
        call.exchange(tail).await?.decoded_body()
    }

    /// Executes the call and returns the accepted response as received.
    ///
    /// The response goes through the same classification and retries as the
    /// other terminals, so it is a `2xx` or `304`. Its headers are available
    /// through [`HttpResponse::header`]; its body may still be encoded, see
    /// [`HttpResponse::decoded_body`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn response(self, tail: &str) -> Result<HttpResponse, HttpError> {
        let call = self.freeze(tail).await?;
        call.exchange(tail).await
    }

    async fn freeze(self, tail: &str) -> Result<Call<'a>, HttpError> {
        let Self {
            config,
            mut request,
            body,
        } = self;

        if let Some(source) = body {
            let raw = drain(source)
                .await
                .map_err(|e| HttpError::transport(tail, e))?;
            request.raw_body = Some(raw);
        }

        Ok(Call { config, request })
    }
}

/// Reads a body source to the end; the source is dropped on return.
async fn drain(mut source: BodySource) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut chunk = vec![0u8; BODY_CHUNK_SIZE];
    loop {
        let read = source.read(&mut chunk).await?;
        if read == 0 {
            return Ok(body);
        }
        body.extend_from_slice(&chunk[..read]);
    }
}

/// A frozen request and the configuration it runs against.
struct Call<'a> {
    config: &'a ElympicsConfig,
    request: RequestSpec,
}

impl Call<'_> {
    fn url(&self, tail: &str) -> Result<Url, HttpError> {
        self.config.endpoint().resolve(&self.request.target(tail))
    }

    /// Sends the request until it is accepted or fails for good.
    async fn exchange(&self, tail: &str) -> Result<HttpResponse, HttpError> {
        let url = self.url(tail)?;
        let policy = self.config.rate_limit();
        let mut retries = 0u32;

        loop {
            let response = self.attempt(&url).await?;
            match classify(response) {
                Disposition::Accept(response) => return Ok(response),
                Disposition::Raise(error) => return Err(error),
                Disposition::Retry(response) => {
                    if !policy.allows(retries) {
                        return Err(MaxHttpRetriesExceededError {
                            code: response.code,
                            tries: retries,
                            url: response.url,
                        }
                        .into());
                    }
                    retries = retries.saturating_add(1);
                    tracing::warn!(
                        "Rate limited by Elympics API at {}, retrying (attempt {})",
                        url,
                        retries
                    );
                    let delay = policy.backoff_delay();
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// Opens a fresh connection and sends the request once.
    async fn attempt(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        let connection = self.open(url)?;
        tracing::debug!(
            method = %self.request.method,
            url = %url,
            "Sending request to Elympics API"
        );

        connection
            .send(self.request.payload())
            .await
            .map_err(|error| {
                // Nothing to classify without a response
                tracing::debug!(
                    url = %url,
                    error = %error,
                    "Request failed before a response was received"
                );
                error
            })
    }

    fn open(&self, url: &Url) -> Result<Box<dyn Connection>, HttpError> {
        let mut connection = self.config.connector().connect(url)?;

        if let Some(key) = self.config.key() {
            connection.set_header(KEY_HEADER, key.as_ref())?;
        }
        for (name, value) in self.request.headers.present() {
            connection.set_header(name, value)?;
        }

        apply_method(&mut *connection, &self.request.method)?;
        connection.set_header("Accept-Encoding", "gzip")?;

        if self.request.has_body() {
            connection.set_header("Content-Type", &self.request.content_type)?;
        }

        Ok(connection)
    }
}

/// Sets `method` on the connection and on the connection it delegates to.
fn apply_method(connection: &mut dyn Connection, method: &str) -> Result<(), HttpError> {
    connection.set_method(method)?;
    if let Some(inner) = connection.delegate() {
        inner.set_method(method)?;
    }

    if connection.method() == method {
        Ok(())
    } else {
        Err(HttpError::Configuration {
            method: method.to_string(),
            reason: format!("transport kept method {}", connection.method()),
        })
    }
}
