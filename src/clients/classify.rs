//! Classification of received responses.
//!
//! Every response that comes back from a [`Connection`](crate::clients::Connection)
//! goes through [`classify`], which decides whether the request succeeded,
//! should be re-attempted from scratch, or has failed for good.

use crate::clients::errors::{AbsentResourceError, ApiError, HttpError};
use crate::clients::http_response::HttpResponse;

/// Status code of an unauthorized response.
pub const UNAUTHORIZED: u16 = 401;
/// Status code of a forbidden (and possibly rate-limited) response.
pub const FORBIDDEN: u16 = 403;
/// Status code of a not-found response.
pub const NOT_FOUND: u16 = 404;

/// What to do with a received response.
#[derive(Debug)]
pub enum Disposition {
    /// The response is a success; decode it.
    Accept(HttpResponse),
    /// The request was rate-limited; send it again.
    Retry(HttpResponse),
    /// The request failed; surface the error.
    Raise(HttpError),
}

/// Classifies a received response.
///
/// - status below 400: [`Disposition::Accept`]
/// - 401: raised at once, credentials are not transient
/// - 403 with `Retry-After`: [`Disposition::Retry`]
/// - 404: [`HttpError::NotFound`] carrying the error body
/// - anything else: [`HttpError::Api`] carrying the error body
///
/// A body with an undecodable `Content-Encoding` raises that failure instead.
#[must_use]
pub fn classify(response: HttpResponse) -> Disposition {
    if response.code < 400 {
        return Disposition::Accept(response);
    }

    if response.code == UNAUTHORIZED {
        return Disposition::Raise(api_error(response, None));
    }

    if response.code == FORBIDDEN && response.retry_after().is_some() {
        return Disposition::Retry(response);
    }

    let error_body = match response.text() {
        Ok(text) if text.is_empty() => None,
        Ok(text) => Some(text),
        Err(error) => return Disposition::Raise(error),
    };

    if response.code == NOT_FOUND {
        return Disposition::Raise(
            AbsentResourceError {
                url: response.url,
                error_body,
            }
            .into(),
        );
    }

    Disposition::Raise(api_error(response, error_body))
}

fn api_error(response: HttpResponse, error_body: Option<String>) -> HttpError {
    ApiError {
        status: Some(response.code),
        message: response.reason,
        url: response.url,
        error_body,
    }
    .into()
}
