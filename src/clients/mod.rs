//! HTTP client types for Elympics API communication.
//!
//! This module provides the request engine used by every API call. It
//! handles request construction, transport, rate-limit retries, continuation
//! pages and response decoding.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`Requester`]: Builds and executes one logical call
//! - [`Fetched`]: A decoded value, or the `304 Not Modified` signal
//! - [`Connector`] / [`Connection`]: The pluggable transport
//! - [`ReqwestConnector`]: The default transport, backed by reqwest
//! - [`ImpatientConnector`]: A transport decorator applying timeouts
//! - [`HttpResponse`]: A received response
//! - [`JsonCodec`]: Decoding of response bodies
//! - [`HttpError`]: The error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use elympics_api::{Elympics, Highscore};
//!
//! let elympics = Elympics::connect("my-api-key")?;
//!
//! let status = elympics
//!     .requester()
//!     .status_code("/getHighscores")
//!     .await?;
//! ```
//!
//! # Retry Behavior
//!
//! - **403 with `Retry-After`**: The request is rebuilt and sent again. By
//!   default there is no limit and no delay; see
//!   [`RateLimitPolicy`](crate::RateLimitPolicy).
//! - **401**: Returned immediately as [`HttpError::Api`].
//! - **Other errors**: Returned immediately without retry.

mod classify;
mod codec;
mod connector;
mod errors;
mod http_request;
mod http_response;
mod requester;

pub use classify::{classify, Disposition};
pub use codec::{JsonCodec, UnknownFields};
pub use connector::{
    Connection, Connector, ImpatientConnector, ReqwestConnection, ReqwestConnector,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, SDK_VERSION,
};
pub use errors::{
    AbsentResourceError, ApiError, DecodeError, HttpError, MaxHttpRetriesExceededError,
};
pub use http_request::{Headers, ParamValue, Parameters, RequestSpec};
pub use http_response::{HttpResponse, PaginationInfo};
pub use requester::{BodySource, Fetched, Requester, BODY_CHUNK_SIZE, KEY_HEADER};
