//! HTTP response types for the Elympics API client.
//!
//! This module provides the [`HttpResponse`] type, the plain-data view of a
//! response that every [`Connection`](crate::clients::Connection) hands back,
//! together with `Link` header pagination parsing and `Content-Encoding`
//! handling.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::clients::errors::HttpError;

/// Pagination links parsed from the `Link` header.
///
/// The header format is `<url>; rel="next", <url>; rel="prev"`. Only the
/// `next` relation drives pagination; `prev` is kept for callers that
/// inspect it.
///
/// # Example
///
/// ```rust
/// use elympics_api::clients::PaginationInfo;
///
/// let info = PaginationInfo::parse_link_header(
///     r#"<https://x/y?page=1>; rel="prev", <https://x/y?page=3>; rel="next""#,
/// );
/// assert_eq!(info.next.as_deref(), Some("https://x/y?page=3"));
/// assert_eq!(info.prev.as_deref(), Some("https://x/y?page=1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// The URL of the previous page, if available.
    pub prev: Option<String>,
    /// The URL of the next page, if available.
    pub next: Option<String>,
}

impl PaginationInfo {
    /// Parses pagination links from a `Link` header value.
    #[must_use]
    pub fn parse_link_header(header_value: &str) -> Self {
        let mut result = Self::default();
        let mut rest = header_value;

        // URLs may contain commas, so links are delimited by their brackets
        while let Some(open) = rest.find('<') {
            let after_open = &rest[open + 1..];
            let Some(close) = after_open.find('>') else {
                break;
            };
            let url = &after_open[..close];
            let params = &after_open[close + 1..];
            let end = params.find('<').unwrap_or(params.len());
            rest = &params[end..];

            let rel = params[..end].split([';', ',']).find_map(|part| {
                part.trim()
                    .strip_prefix("rel=")
                    .map(|value| value.trim_matches('"'))
            });

            for rel in rel.into_iter().flat_map(str::split_whitespace) {
                match rel {
                    "next" => result.next = Some(url.to_string()),
                    "prev" | "previous" => result.prev = Some(url.to_string()),
                    _ => {}
                }
            }
        }

        result
    }
}

/// An HTTP response received from the Elympics API.
///
/// Header names are stored lowercased; a header may carry several values.
/// The body is kept exactly as received, so it may still be gzip-encoded;
/// use [`decoded_body`](Self::decoded_body) or [`text`](Self::text) to read it.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// The HTTP reason phrase, if known.
    pub reason: Option<String>,
    /// The URL the response was received from.
    pub url: String,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, normalizing header names to lowercase.
    #[must_use]
    pub fn new(
        code: u16,
        url: impl Into<String>,
        headers: impl IntoIterator<Item = (String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            normalized.entry(name.to_lowercase()).or_default().push(value);
        }

        Self {
            code,
            reason: None,
            url: url.into(),
            headers: normalized,
            body,
        }
    }

    /// Sets the reason phrase.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of the named header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Retry-After` header value, if present.
    ///
    /// Its presence on a `403` marks the response as rate-limited; the
    /// value itself is not interpreted.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        self.header("retry-after")
    }

    /// Returns the continuation URL from the `Link` header, if any.
    #[must_use]
    pub fn next_link(&self) -> Option<String> {
        self.headers
            .get("link")?
            .iter()
            .filter_map(|value| PaginationInfo::parse_link_header(value).next)
            .last()
    }

    /// Returns the body with any `Content-Encoding` removed.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::UnsupportedEncoding`] for any encoding other than
    /// gzip, and [`HttpError::Decompress`] if the gzip stream is corrupt.
    pub fn decoded_body(&self) -> Result<Vec<u8>, HttpError> {
        match self.header("content-encoding") {
            None => Ok(self.body.clone()),
            Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => {
                if self.body.is_empty() {
                    return Ok(Vec::new());
                }
                let mut decoded = Vec::new();
                GzDecoder::new(self.body.as_slice())
                    .read_to_end(&mut decoded)
                    .map_err(|source| HttpError::Decompress {
                        url: self.url.clone(),
                        source,
                    })?;
                Ok(decoded)
            }
            Some(encoding) => Err(HttpError::UnsupportedEncoding {
                encoding: encoding.to_string(),
            }),
        }
    }

    /// Returns the decoded body as UTF-8 text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// See [`decoded_body`](Self::decoded_body).
    pub fn text(&self) -> Result<String, HttpError> {
        let bytes = self.decoded_body()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
